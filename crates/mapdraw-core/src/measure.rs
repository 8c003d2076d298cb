//! Length and area of display geometries.
//!
//! Geodesic measurement unprojects to lon/lat and works on a sphere of
//! radius [`EARTH_RADIUS`], as web map libraries do. Planar measurement
//! uses the projected coordinates directly.

use crate::geometry::{Coordinate, Geometry};
use crate::projection::to_lon_lat;
use serde::{Deserialize, Serialize};

/// Mean earth radius used for geodesic measurement.
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// How lengths and areas are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureMethod {
    /// On the sphere, in metres / square metres.
    #[default]
    Geodesic,
    /// In projected map units.
    Planar,
}

impl MeasureMethod {
    /// Length of a line (or polygon outline). Points and circles measure 0.
    pub fn length(&self, geometry: &Geometry) -> f64 {
        match geometry {
            Geometry::LineString(coords) => self.path_length(coords),
            Geometry::Polygon(rings) => rings.iter().map(|ring| self.path_length(ring)).sum(),
            Geometry::Point(_) | Geometry::Circle { .. } => 0.0,
        }
    }

    /// Area of a polygon or circle; holes are subtracted. Lines and points measure 0.
    ///
    /// Circles are measured through their 32-gon approximation.
    pub fn area(&self, geometry: &Geometry) -> f64 {
        match geometry {
            Geometry::Polygon(rings) => {
                let mut rings = rings.iter().map(|ring| self.ring_area(ring).abs());
                let exterior = rings.next().unwrap_or(0.0);
                exterior - rings.sum::<f64>()
            }
            Geometry::Circle { .. } => geometry
                .circle_polygon()
                .map(|polygon| self.area(&polygon))
                .unwrap_or(0.0),
            Geometry::Point(_) | Geometry::LineString(_) => 0.0,
        }
    }

    fn path_length(&self, coords: &[Coordinate]) -> f64 {
        coords
            .windows(2)
            .map(|w| match self {
                MeasureMethod::Geodesic => haversine_distance(to_lon_lat(w[0]), to_lon_lat(w[1])),
                MeasureMethod::Planar => w[0].distance(w[1]),
            })
            .sum()
    }

    fn ring_area(&self, ring: &[Coordinate]) -> f64 {
        match self {
            MeasureMethod::Geodesic => {
                let lon_lat: Vec<Coordinate> = ring.iter().map(|&c| to_lon_lat(c)).collect();
                spherical_ring_area(&lon_lat)
            }
            MeasureMethod::Planar => {
                ring.windows(2)
                    .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
                    .sum::<f64>()
                    / 2.0
            }
        }
    }
}

/// Great-circle distance between two lon/lat coordinates.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let half_dlat = (lat2 - lat1) / 2.0;
    let half_dlon = (b.x - a.x).to_radians() / 2.0;
    let h = half_dlat.sin().powi(2) + half_dlon.sin().powi(2) * lat1.cos() * lat2.cos();
    2.0 * EARTH_RADIUS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Signed area of a lon/lat ring on the sphere.
pub fn spherical_ring_area(ring: &[Coordinate]) -> f64 {
    let Some(&last) = ring.last() else {
        return 0.0;
    };
    let (mut x1, mut y1) = (last.x, last.y);
    let mut area = 0.0;
    for c in ring {
        area += (c.x - x1).to_radians() * (2.0 + y1.to_radians().sin() + c.y.to_radians().sin());
        x1 = c.x;
        y1 = c.y;
    }
    area * EARTH_RADIUS * EARTH_RADIUS / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::from_lon_lat;
    use kurbo::Point;

    #[test]
    fn test_planar_length_and_area() {
        let line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)]);
        assert_eq!(MeasureMethod::Planar.length(&line), 50.0);

        let square = Geometry::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
        ]);
        assert_eq!(MeasureMethod::Planar.area(&square), 2500.0);
    }

    #[test]
    fn test_geodesic_degree_of_longitude_at_equator() {
        let line = Geometry::LineString(vec![
            from_lon_lat(Point::new(0.0, 0.0)),
            from_lon_lat(Point::new(1.0, 0.0)),
        ]);
        let length = MeasureMethod::Geodesic.length(&line);
        // 2 * pi * R / 360
        assert!((length - 111_195.08).abs() < 1.0, "got {length}");
    }

    #[test]
    fn test_circle_area_uses_polygon_approximation() {
        let circle = Geometry::Circle { center: Point::ZERO, radius: 10.0 };
        let area = MeasureMethod::Planar.area(&circle);
        // Inscribed 32-gon: n/2 * r^2 * sin(2pi/n)
        let expected = 16.0 * 100.0 * (2.0 * std::f64::consts::PI / 32.0).sin();
        assert!((area - expected).abs() < 1e-9);
        assert!(area < std::f64::consts::PI * 100.0);
    }

    #[test]
    fn test_lines_have_no_area() {
        let line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(MeasureMethod::Geodesic.area(&line), 0.0);
    }
}
