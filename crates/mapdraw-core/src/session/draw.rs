//! Draw session: one sketch at a time, finished into a layer feature.

use super::sketch::Sketch;
use crate::feature::Feature;
use crate::format::describe;
use crate::geometry::{Coordinate, Geometry, GeometryKind};
use crate::measure::MeasureMethod;
use crate::tooltip::{Tooltip, TooltipOverlays};

/// Result of feeding an input event to a draw session.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// The event had no effect.
    Ignored,
    Started,
    Updated,
    /// The sketch was completed into a new, unsaved feature.
    Finished(Feature),
    /// The sketch became degenerate and was dropped.
    Aborted,
}

/// Drawing of one geometry kind.
#[derive(Debug)]
pub struct DrawSession {
    kind: GeometryKind,
    method: MeasureMethod,
    /// Pre-armed tooltip for the next sketch. Points never get one.
    tooltip: Option<Tooltip>,
    sketch: Option<Sketch>,
}

impl DrawSession {
    pub fn new(kind: GeometryKind, method: MeasureMethod, overlays: &mut TooltipOverlays) -> Self {
        let tooltip = (kind != GeometryKind::Point).then(|| overlays.create());
        Self {
            kind,
            method,
            tooltip,
            sketch: None,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn is_sketching(&self) -> bool {
        self.sketch.is_some()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    /// Handle a single click. A click within `tolerance` of the last fixed
    /// vertex, or of the first vertex of a polygon, finishes the sketch
    /// instead of adding a vertex.
    pub fn click(&mut self, at: Coordinate, tolerance: f64, overlays: &mut TooltipOverlays) -> DrawOutcome {
        match self.sketch.as_mut() {
            None => {
                let mut sketch = Sketch::begin(self.kind, at);
                if let Some(tooltip) = &self.tooltip {
                    sketch.bind(tooltip, self.method);
                }
                self.sketch = Some(sketch);
                log::debug!("Draw {} started", self.kind);
                if self.kind == GeometryKind::Point {
                    return self.finish(overlays);
                }
                DrawOutcome::Started
            }
            Some(sketch) => match self.kind {
                GeometryKind::Circle => {
                    sketch.move_pointer(at);
                    self.finish(overlays)
                }
                _ if sketch.closes_at(at, tolerance) => self.finish(overlays),
                _ => {
                    sketch.push(at);
                    DrawOutcome::Updated
                }
            },
        }
    }

    pub fn pointer_move(&mut self, at: Coordinate) -> DrawOutcome {
        match self.sketch.as_mut() {
            Some(sketch) => {
                sketch.move_pointer(at);
                DrawOutcome::Updated
            }
            None => DrawOutcome::Ignored,
        }
    }

    /// Complete the sketch. Ignored while lines have fewer than two or
    /// polygons fewer than three fixed vertices.
    pub fn finish(&mut self, overlays: &mut TooltipOverlays) -> DrawOutcome {
        let Some(sketch) = self.sketch.as_ref() else {
            return DrawOutcome::Ignored;
        };
        let enough = match self.kind {
            GeometryKind::LineString => sketch.fixed_len() >= 2,
            GeometryKind::Polygon => sketch.fixed_len() >= 3,
            GeometryKind::Point | GeometryKind::Circle => true,
        };
        if !enough {
            return DrawOutcome::Ignored;
        }
        let Some(mut sketch) = self.sketch.take() else {
            return DrawOutcome::Ignored;
        };
        let geometry = sketch.freeze();

        if let Some(tooltip) = self.tooltip.take() {
            overlays.pin(tooltip);
            self.tooltip = Some(overlays.create());
        }

        let mut feature = Feature::new(geometry);
        feature.description = describe(&feature.geometry, self.method);
        log::debug!("Draw {} finished: {}", self.kind, feature.description);
        DrawOutcome::Finished(feature)
    }

    /// Remove the last fixed vertex, aborting when the sketch degenerates.
    pub fn undo_last_point(&mut self) -> DrawOutcome {
        let Some(sketch) = self.sketch.as_mut() else {
            return DrawOutcome::Ignored;
        };
        sketch.pop();
        let degenerate = match sketch.geometry() {
            Geometry::Circle { .. } => true,
            Geometry::LineString(coords) => coords.len() <= 1,
            Geometry::Polygon(rings) => rings.first().is_none_or(|ring| ring.len() <= 2),
            Geometry::Point(_) => true,
        };
        if degenerate {
            self.abort();
            DrawOutcome::Aborted
        } else {
            DrawOutcome::Updated
        }
    }

    /// Drop the sketch and hide its tooltip.
    pub fn abort(&mut self) {
        if self.sketch.take().is_some() {
            log::debug!("Draw {} aborted", self.kind);
        }
        if let Some(tooltip) = &self.tooltip {
            tooltip.hide();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::TooltipClass;
    use kurbo::Point;

    const TOLERANCE: f64 = 1.0;

    fn session(kind: GeometryKind, overlays: &mut TooltipOverlays) -> DrawSession {
        DrawSession::new(kind, MeasureMethod::Planar, overlays)
    }

    #[test]
    fn test_point_finishes_on_first_click_without_tooltip() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Point, &mut overlays);
        assert!(draw.tooltip().is_none());

        let DrawOutcome::Finished(feature) = draw.click(Point::new(1.0, 2.0), TOLERANCE, &mut overlays) else {
            panic!("point should finish immediately");
        };
        assert_eq!(feature.name, "Point");
        assert_eq!(feature.description, "Point");
        assert!(overlays.is_empty());
    }

    #[test]
    fn test_line_tooltip_tracks_sketch() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::LineString, &mut overlays);
        assert_eq!(overlays.len(), 1);

        assert_eq!(draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays), DrawOutcome::Started);
        draw.pointer_move(Point::new(30.0, 40.0));
        let tooltip = draw.tooltip().unwrap();
        assert_eq!(tooltip.text(), "50 m");
        assert_eq!(tooltip.position(), Some(Point::new(30.0, 40.0)));
    }

    #[test]
    fn test_finish_pins_tooltip_and_rearms() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::LineString, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        assert_eq!(draw.finish(&mut overlays), DrawOutcome::Ignored);

        draw.click(Point::new(0.0, 55.0), TOLERANCE, &mut overlays);
        draw.pointer_move(Point::new(500.0, 500.0));
        let DrawOutcome::Finished(feature) = draw.finish(&mut overlays) else {
            panic!("line with two vertices should finish");
        };
        assert_eq!(feature.name, "Line");
        assert_eq!(feature.description, "Length: 55 m");

        let views = overlays.views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].class, TooltipClass::Static);
        assert_eq!(views[0].text, "55 m");
        assert_eq!(views[1].class, TooltipClass::Measure);
        assert!(!draw.is_sketching());
    }

    #[test]
    fn test_circle_second_click_finishes() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Circle, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        let DrawOutcome::Finished(feature) = draw.click(Point::new(10.0, 0.0), TOLERANCE, &mut overlays) else {
            panic!("circle should finish on second click");
        };
        assert_eq!(feature.geometry, Geometry::Circle { center: Point::ZERO, radius: 10.0 });
        assert!(feature.description.starts_with("Area: "));
    }

    #[test]
    fn test_undo_on_circle_always_aborts() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Circle, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        draw.pointer_move(Point::new(20.0, 0.0));
        assert_eq!(draw.undo_last_point(), DrawOutcome::Aborted);
        assert!(!draw.is_sketching());
        assert!(!draw.tooltip().unwrap().is_visible());
    }

    #[test]
    fn test_undo_line_aborts_when_single_coordinate_left() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::LineString, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        draw.click(Point::new(10.0, 0.0), TOLERANCE, &mut overlays);
        assert_eq!(draw.undo_last_point(), DrawOutcome::Updated);
        assert!(draw.is_sketching());
        assert_eq!(draw.undo_last_point(), DrawOutcome::Aborted);
        assert_eq!(draw.undo_last_point(), DrawOutcome::Ignored);
    }

    #[test]
    fn test_undo_polygon_aborts_at_two_ring_coordinates() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Polygon, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        draw.click(Point::new(10.0, 0.0), TOLERANCE, &mut overlays);
        draw.click(Point::new(10.0, 10.0), TOLERANCE, &mut overlays);
        assert_eq!(draw.undo_last_point(), DrawOutcome::Updated);
        assert_eq!(draw.undo_last_point(), DrawOutcome::Updated);
        assert_eq!(draw.undo_last_point(), DrawOutcome::Aborted);
        assert!(!draw.is_sketching());
        assert!(!draw.tooltip().unwrap().is_visible());
    }

    #[test]
    fn test_click_on_last_vertex_finishes_without_duplicate() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::LineString, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        assert_eq!(draw.click(Point::new(0.0, 0.5), TOLERANCE, &mut overlays), DrawOutcome::Ignored);
        draw.click(Point::new(0.0, 55.0), TOLERANCE, &mut overlays);
        let DrawOutcome::Finished(feature) = draw.click(Point::new(0.0, 55.0), TOLERANCE, &mut overlays) else {
            panic!("click on the last vertex should finish");
        };
        assert_eq!(
            feature.geometry,
            Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(0.0, 55.0)])
        );
        assert_eq!(draw.finish(&mut overlays), DrawOutcome::Ignored);
    }

    #[test]
    fn test_click_on_first_polygon_vertex_closes_ring() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Polygon, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        draw.click(Point::new(10.0, 0.0), TOLERANCE, &mut overlays);
        draw.click(Point::new(10.0, 10.0), TOLERANCE, &mut overlays);
        let DrawOutcome::Finished(feature) = draw.click(Point::new(0.2, 0.0), TOLERANCE, &mut overlays) else {
            panic!("click on the first vertex should close the polygon");
        };
        assert_eq!(feature.geometry.vertices().len(), 3);
    }

    #[test]
    fn test_dropping_session_unmounts_live_tooltip() {
        let mut overlays = TooltipOverlays::new();
        let mut draw = session(GeometryKind::Polygon, &mut overlays);
        draw.click(Point::new(0.0, 0.0), TOLERANCE, &mut overlays);
        assert_eq!(overlays.len(), 1);
        drop(draw);
        assert!(overlays.is_empty());
    }
}
