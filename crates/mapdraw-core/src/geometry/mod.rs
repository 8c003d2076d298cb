//! Geometry model for editable map features.
//!
//! Coordinates are in the display projection (EPSG:3857) unless a function
//! says otherwise.

mod observable;

pub use observable::{ChangeSubscription, ObservableGeometry};

use kurbo::{Line, ParamCurve, ParamCurveNearest, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A map coordinate `(x, y)`.
pub type Coordinate = Point;

/// Number of sides used when a circle is approximated by a polygon.
pub const CIRCLE_POLYGON_SIDES: usize = 32;

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-9;

/// The geometry kinds a feature can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Circle,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 4] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::Circle,
    ];

    /// Name as shown by the geometry-kind selector.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::Circle => "Circle",
        }
    }

    /// Parse a selector value. Matching is case-insensitive; `"None"` yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A feature geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Linear rings, exterior first. Rings are closed (first == last).
    Polygon(Vec<Vec<Coordinate>>),
    Circle { center: Coordinate, radius: f64 },
}

impl Geometry {
    /// Build a polygon from an open or closed exterior ring.
    pub fn polygon(mut exterior: Vec<Coordinate>) -> Self {
        close_ring(&mut exterior);
        Geometry::Polygon(vec![exterior])
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::Circle { .. } => GeometryKind::Circle,
        }
    }

    /// Editable vertices: the exterior ring without its closing coordinate,
    /// the centre for circles.
    pub fn vertices(&self) -> Vec<Coordinate> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::LineString(coords) => coords.clone(),
            Geometry::Polygon(rings) => rings
                .first()
                .map(|ring| open_ring(ring).to_vec())
                .unwrap_or_default(),
            Geometry::Circle { center, .. } => vec![*center],
        }
    }

    /// The last coordinate of the geometry.
    pub fn last_coordinate(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::LineString(coords) => coords.last().copied(),
            Geometry::Polygon(rings) => rings.last().and_then(|ring| ring.last().copied()),
            Geometry::Circle { center, .. } => Some(*center),
        }
    }

    /// Segments of the geometry outline. Points and circles have none.
    pub fn segments(&self) -> Vec<Line> {
        match self {
            Geometry::LineString(coords) => coords.windows(2).map(|w| Line::new(w[0], w[1])).collect(),
            Geometry::Polygon(rings) => rings
                .iter()
                .flat_map(|ring| ring.windows(2).map(|w| Line::new(w[0], w[1])))
                .collect(),
            Geometry::Point(_) | Geometry::Circle { .. } => Vec::new(),
        }
    }

    /// Closest point on the geometry to `to`.
    ///
    /// For lines and polygons this is a point on the outline; vertices are
    /// returned exactly, without interpolation error.
    pub fn closest_point(&self, to: Coordinate) -> Coordinate {
        match self {
            Geometry::Point(p) => *p,
            Geometry::Circle { center, radius } => {
                let delta = to - *center;
                let distance = delta.hypot();
                if distance == 0.0 {
                    *center
                } else {
                    *center + delta * (*radius / distance)
                }
            }
            Geometry::LineString(_) | Geometry::Polygon(_) => {
                let segments = self.segments();
                if segments.is_empty() {
                    return self.vertices().first().copied().unwrap_or(to);
                }
                segments
                    .iter()
                    .map(|segment| nearest_on_segment(*segment, to))
                    .min_by(|a, b| a.distance_squared(to).total_cmp(&b.distance_squared(to)))
                    .unwrap_or(to)
            }
        }
    }

    /// A point guaranteed to lie inside a polygon, used to anchor area labels.
    ///
    /// Scans the exterior ring at the mid-height of its extent and takes the
    /// middle of the widest inside span. Falls back to the vertex centroid.
    pub fn interior_point(&self) -> Option<Coordinate> {
        let Geometry::Polygon(rings) = self else {
            return None;
        };
        let exterior = rings.first()?;
        let (min_y, max_y) = exterior
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        if !min_y.is_finite() {
            return None;
        }
        let y = (min_y + max_y) / 2.0;

        let mut crossings: Vec<f64> = exterior
            .windows(2)
            .filter_map(|w| {
                let (a, b) = (w[0], w[1]);
                if (a.y <= y && y < b.y) || (b.y <= y && y < a.y) {
                    Some(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x))
                } else {
                    None
                }
            })
            .collect();
        crossings.sort_by(f64::total_cmp);

        let widest = crossings
            .chunks_exact(2)
            .max_by(|a, b| (a[1] - a[0]).total_cmp(&(b[1] - b[0])));
        match widest {
            Some(span) if span[1] > span[0] => Some(Point::new((span[0] + span[1]) / 2.0, y)),
            _ => centroid(open_ring(exterior)),
        }
    }

    /// Whether `point` hits the geometry within `tolerance` map units.
    pub fn hit_test(&self, point: Coordinate, tolerance: f64) -> bool {
        match self {
            Geometry::Point(p) => p.distance(point) <= tolerance,
            Geometry::Circle { center, radius } => center.distance(point) <= radius + tolerance,
            Geometry::LineString(_) => self.closest_point(point).distance(point) <= tolerance,
            Geometry::Polygon(rings) => {
                rings.first().is_some_and(|ring| ring_contains(ring, point))
                    || self.closest_point(point).distance(point) <= tolerance
            }
        }
    }

    /// Apply `f` to every coordinate. Circle radii are left unchanged.
    pub fn map_coordinates(&self, f: impl Fn(Coordinate) -> Coordinate) -> Geometry {
        match self {
            Geometry::Point(p) => Geometry::Point(f(*p)),
            Geometry::LineString(coords) => Geometry::LineString(coords.iter().map(|&c| f(c)).collect()),
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|&c| f(c)).collect())
                    .collect(),
            ),
            Geometry::Circle { center, radius } => Geometry::Circle {
                center: f(*center),
                radius: *radius,
            },
        }
    }

    /// Polygon approximation of a circle, or `None` for other kinds.
    pub fn circle_polygon(&self) -> Option<Geometry> {
        match self {
            Geometry::Circle { center, radius } => {
                Some(circle_to_polygon(*center, *radius, CIRCLE_POLYGON_SIDES))
            }
            _ => None,
        }
    }
}

/// Regular polygon with `sides` vertices inscribed in a circle.
pub fn circle_to_polygon(center: Coordinate, radius: f64, sides: usize) -> Geometry {
    let ring = (0..sides)
        .map(|i| {
            let angle = (i as f64) * 2.0 * PI / sides as f64;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    Geometry::polygon(ring)
}

/// Close a ring in place if its last coordinate differs from the first.
pub fn close_ring(ring: &mut Vec<Coordinate>) {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last || ring.len() == 1 {
            ring.push(first);
        }
    }
}

/// The ring without its closing coordinate.
fn open_ring(ring: &[Coordinate]) -> &[Coordinate] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Nearest point on a segment; endpoints are returned as-is.
fn nearest_on_segment(segment: Line, to: Coordinate) -> Coordinate {
    let nearest = segment.nearest(to, NEAREST_ACCURACY);
    if nearest.t <= 0.0 {
        segment.p0
    } else if nearest.t >= 1.0 {
        segment.p1
    } else {
        segment.eval(nearest.t)
    }
}

/// Even-odd point-in-ring test.
fn ring_contains(ring: &[Coordinate], point: Coordinate) -> bool {
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
