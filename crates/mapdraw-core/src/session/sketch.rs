//! In-progress sketch geometry shared by draw and measure sessions.

use crate::geometry::{ChangeSubscription, Coordinate, Geometry, GeometryKind, ObservableGeometry};
use crate::measure::MeasureMethod;
use crate::tooltip::Tooltip;

/// Fixed vertices plus a trailing vertex that follows the pointer.
#[derive(Debug)]
pub(crate) struct Sketch {
    kind: GeometryKind,
    vertices: Vec<Coordinate>,
    pointer: Coordinate,
    geometry: ObservableGeometry,
    subscription: Option<ChangeSubscription>,
}

impl Sketch {
    /// Start a sketch with its first fixed vertex.
    pub fn begin(kind: GeometryKind, at: Coordinate) -> Self {
        let vertices = vec![at];
        let geometry = ObservableGeometry::new(build(kind, &vertices, at));
        Self {
            kind,
            vertices,
            pointer: at,
            geometry,
            subscription: None,
        }
    }

    /// Feed the tooltip from this sketch's change stream.
    pub fn bind(&mut self, tooltip: &Tooltip, method: MeasureMethod) {
        self.subscription = Some(tooltip.follow(&self.geometry, method));
    }

    /// Detach the tooltip follower.
    pub fn unbind(&mut self) {
        self.subscription = None;
    }

    /// Number of fixed vertices.
    pub fn fixed_len(&self) -> usize {
        self.vertices.len()
    }

    /// Live geometry, including the trailing vertex.
    pub fn geometry(&self) -> Geometry {
        self.geometry.get()
    }

    /// Whether a click at `at` lands on a vertex that finishes the sketch:
    /// the last fixed vertex, or the first one of a polygon with at least
    /// three fixed vertices.
    pub fn closes_at(&self, at: Coordinate, tolerance: f64) -> bool {
        let near = |vertex: &Coordinate| vertex.distance(at) <= tolerance;
        match self.kind {
            GeometryKind::LineString => self.vertices.last().is_some_and(near),
            GeometryKind::Polygon => {
                self.vertices.last().is_some_and(near)
                    || (self.vertices.len() >= 3 && self.vertices.first().is_some_and(near))
            }
            GeometryKind::Point | GeometryKind::Circle => false,
        }
    }

    pub fn push(&mut self, at: Coordinate) {
        self.vertices.push(at);
        self.pointer = at;
        self.refresh();
    }

    pub fn move_pointer(&mut self, at: Coordinate) {
        self.pointer = at;
        self.refresh();
    }

    /// Drop the last fixed vertex, keeping the trailing one.
    pub fn pop(&mut self) {
        self.vertices.pop();
        self.refresh();
    }

    /// The geometry a finished sketch keeps: fixed vertices only, except for
    /// circles whose radius comes from the pointer.
    pub fn finished(&self) -> Geometry {
        match self.kind {
            GeometryKind::LineString => Geometry::LineString(self.vertices.clone()),
            GeometryKind::Polygon => Geometry::polygon(self.vertices.clone()),
            GeometryKind::Point | GeometryKind::Circle => self.geometry.get(),
        }
    }

    /// Publish the finished geometry to listeners one last time.
    pub fn freeze(&mut self) -> Geometry {
        let geometry = self.finished();
        self.geometry.set(geometry.clone());
        self.unbind();
        geometry
    }

    fn refresh(&self) {
        self.geometry.set(build(self.kind, &self.vertices, self.pointer));
    }
}

fn build(kind: GeometryKind, vertices: &[Coordinate], pointer: Coordinate) -> Geometry {
    match kind {
        GeometryKind::Point => Geometry::Point(vertices.first().copied().unwrap_or(pointer)),
        GeometryKind::LineString => {
            let mut coords = vertices.to_vec();
            coords.push(pointer);
            Geometry::LineString(coords)
        }
        GeometryKind::Polygon => {
            let mut ring = vertices.to_vec();
            ring.push(pointer);
            let first = ring[0];
            ring.push(first);
            Geometry::Polygon(vec![ring])
        }
        GeometryKind::Circle => {
            let center = vertices.first().copied().unwrap_or(pointer);
            Geometry::Circle {
                center,
                radius: center.distance(pointer),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_polygon_sketch_closes_over_pointer() {
        let mut sketch = Sketch::begin(GeometryKind::Polygon, Point::new(0.0, 0.0));
        sketch.push(Point::new(10.0, 0.0));
        sketch.move_pointer(Point::new(10.0, 10.0));
        let Geometry::Polygon(rings) = sketch.geometry() else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][3], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_finished_line_drops_trailing_vertex() {
        let mut sketch = Sketch::begin(GeometryKind::LineString, Point::new(0.0, 0.0));
        sketch.push(Point::new(5.0, 0.0));
        sketch.move_pointer(Point::new(9.0, 9.0));
        assert_eq!(
            sketch.finished(),
            Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)])
        );
    }

    #[test]
    fn test_circle_radius_follows_pointer() {
        let mut sketch = Sketch::begin(GeometryKind::Circle, Point::new(1.0, 1.0));
        sketch.move_pointer(Point::new(4.0, 5.0));
        assert_eq!(
            sketch.finished(),
            Geometry::Circle { center: Point::new(1.0, 1.0), radius: 5.0 }
        );
    }

    #[test]
    fn test_closes_on_last_or_first_polygon_vertex() {
        let mut sketch = Sketch::begin(GeometryKind::Polygon, Point::new(0.0, 0.0));
        sketch.push(Point::new(10.0, 0.0));
        assert!(sketch.closes_at(Point::new(10.5, 0.0), 1.0));
        assert!(!sketch.closes_at(Point::new(0.0, 0.0), 1.0));
        sketch.push(Point::new(10.0, 10.0));
        assert!(sketch.closes_at(Point::new(0.0, 0.5), 1.0));
        assert!(!sketch.closes_at(Point::new(5.0, 5.0), 1.0));
    }
}
