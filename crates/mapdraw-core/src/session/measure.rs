//! Two-point distance measurement. Never persisted.

use super::sketch::Sketch;
use crate::feature::{Feature, FeatureStyle};
use crate::geometry::{Coordinate, Geometry, GeometryKind};
use crate::measure::MeasureMethod;
use crate::tooltip::{Tooltip, TooltipOverlays};
use uuid::Uuid;

/// Holds the last finished measurement segment and its label.
#[derive(Debug, Default)]
pub struct MeasureLayer {
    segment: Option<Feature>,
    tooltip: Option<Uuid>,
}

impl MeasureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(&self) -> Option<&Feature> {
        self.segment.as_ref()
    }

    /// Remove the segment and unpin its static tooltip.
    pub fn clear(&mut self, overlays: &mut TooltipOverlays) {
        self.segment = None;
        if let Some(id) = self.tooltip.take() {
            overlays.unpin(id);
        }
    }
}

/// Result of feeding an input event to a measure session.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureOutcome {
    Ignored,
    Started,
    Updated,
    /// Segment moved to the measure layer; carries the formatted length.
    Finished(String),
    Aborted,
}

#[derive(Debug)]
pub struct MeasureSession {
    method: MeasureMethod,
    tooltip: Option<Tooltip>,
    sketch: Option<Sketch>,
}

impl MeasureSession {
    pub fn new(method: MeasureMethod) -> Self {
        Self {
            method,
            tooltip: None,
            sketch: None,
        }
    }

    pub fn is_sketching(&self) -> bool {
        self.sketch.is_some()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn click(
        &mut self,
        at: Coordinate,
        layer: &mut MeasureLayer,
        overlays: &mut TooltipOverlays,
    ) -> MeasureOutcome {
        let Some(mut sketch) = self.sketch.take() else {
            layer.clear(overlays);
            let tooltip = overlays.create();
            let mut sketch = Sketch::begin(GeometryKind::LineString, at);
            sketch.bind(&tooltip, self.method);
            self.tooltip = Some(tooltip);
            self.sketch = Some(sketch);
            return MeasureOutcome::Started;
        };
        sketch.push(at);
        let geometry = sketch.freeze();

        let mut segment = Feature::new(geometry);
        segment.style = FeatureStyle::Measurement;
        let text = match self.tooltip.take() {
            Some(tooltip) => {
                let text = tooltip.text();
                layer.tooltip = Some(tooltip.id());
                overlays.pin(tooltip);
                text
            }
            None => String::new(),
        };
        layer.segment = Some(segment);
        log::debug!("Measured {}", text);
        MeasureOutcome::Finished(text)
    }

    pub fn pointer_move(&mut self, at: Coordinate) -> MeasureOutcome {
        match self.sketch.as_mut() {
            Some(sketch) => {
                sketch.move_pointer(at);
                MeasureOutcome::Updated
            }
            None => MeasureOutcome::Ignored,
        }
    }

    pub fn undo_last_point(&mut self) -> MeasureOutcome {
        let Some(sketch) = self.sketch.as_mut() else {
            return MeasureOutcome::Ignored;
        };
        sketch.pop();
        match sketch.geometry() {
            Geometry::LineString(coords) if coords.len() > 1 => MeasureOutcome::Updated,
            _ => {
                self.abort();
                MeasureOutcome::Aborted
            }
        }
    }

    pub fn abort(&mut self) {
        self.sketch = None;
        if let Some(tooltip) = &self.tooltip {
            tooltip.hide();
        }
    }
}
