//! Measurement tooltip overlays.
//!
//! A live tooltip belongs to the session that created it and disappears from
//! the map when that session drops it. Finished measurements pin their
//! tooltip as a static label that outlives the session.

use crate::format::measure_label;
use crate::geometry::{ChangeSubscription, Coordinate, ObservableGeometry};
use crate::measure::MeasureMethod;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Visual class of a tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipClass {
    /// Follows the geometry being drawn or edited.
    Measure,
    /// Frozen label of a finished sketch.
    Static,
}

#[derive(Debug)]
struct TooltipState {
    id: Uuid,
    text: String,
    position: Option<Coordinate>,
    class: TooltipClass,
}

/// Handle to a floating label anchored to a map coordinate.
#[derive(Debug, Clone)]
pub struct Tooltip(Rc<RefCell<TooltipState>>);

impl Tooltip {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(TooltipState {
            id: Uuid::new_v4(),
            text: String::new(),
            position: None,
            class: TooltipClass::Measure,
        })))
    }

    pub fn id(&self) -> Uuid {
        self.0.borrow().id
    }

    pub fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.0.borrow().position
    }

    pub fn class(&self) -> TooltipClass {
        self.0.borrow().class
    }

    /// A tooltip is shown only while it has a position.
    pub fn is_visible(&self) -> bool {
        self.0.borrow().position.is_some()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.0.borrow_mut().text = text.into();
    }

    pub fn set_position(&self, position: Option<Coordinate>) {
        self.0.borrow_mut().position = position;
    }

    /// Remove the tooltip from view and clear its text.
    pub fn hide(&self) {
        let mut state = self.0.borrow_mut();
        state.position = None;
        state.text.clear();
    }

    pub fn view(&self) -> TooltipView {
        let state = self.0.borrow();
        TooltipView {
            id: state.id,
            text: state.text.clone(),
            position: state.position,
            class: state.class,
        }
    }

    /// Keep the label updated from a geometry's change stream.
    pub fn follow(&self, geometry: &ObservableGeometry, method: MeasureMethod) -> ChangeSubscription {
        let tooltip = self.clone();
        geometry.on_change(move |geometry| match measure_label(geometry, method) {
            Some((text, anchor)) => {
                tooltip.set_text(text);
                tooltip.set_position(Some(anchor));
            }
            None => tooltip.hide(),
        })
    }
}

/// Snapshot of a tooltip for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipView {
    pub id: Uuid,
    pub text: String,
    pub position: Option<Coordinate>,
    pub class: TooltipClass,
}

/// All tooltip overlays mounted on one map.
#[derive(Debug, Default)]
pub struct TooltipOverlays {
    live: Vec<Weak<RefCell<TooltipState>>>,
    pinned: Vec<Tooltip>,
}

impl TooltipOverlays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, hidden measure tooltip.
    pub fn create(&mut self) -> Tooltip {
        self.live.retain(|weak| weak.strong_count() > 0);
        let tooltip = Tooltip::new();
        self.live.push(Rc::downgrade(&tooltip.0));
        tooltip
    }

    /// Freeze a tooltip as a static label owned by the map.
    pub fn pin(&mut self, tooltip: Tooltip) {
        tooltip.0.borrow_mut().class = TooltipClass::Static;
        self.live.retain(|weak| !std::ptr::eq(weak.as_ptr(), Rc::as_ptr(&tooltip.0)));
        self.pinned.push(tooltip);
    }

    /// Remove a pinned tooltip. Returns whether one was removed.
    pub fn unpin(&mut self, id: Uuid) -> bool {
        let before = self.pinned.len();
        self.pinned.retain(|tooltip| tooltip.id() != id);
        self.pinned.len() != before
    }

    /// Every tooltip still mounted, static labels first.
    pub fn views(&self) -> Vec<TooltipView> {
        self.pinned
            .iter()
            .map(Tooltip::view)
            .chain(
                self.live
                    .iter()
                    .filter_map(Weak::upgrade)
                    .map(|state| Tooltip(state).view()),
            )
            .collect()
    }

    /// Number of mounted tooltips.
    pub fn len(&self) -> usize {
        self.pinned.len() + self.live.iter().filter(|weak| weak.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.pinned.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use kurbo::Point;

    #[test]
    fn test_dropped_tooltip_is_unmounted() {
        let mut overlays = TooltipOverlays::new();
        let tooltip = overlays.create();
        assert_eq!(overlays.len(), 1);
        drop(tooltip);
        assert!(overlays.is_empty());
    }

    #[test]
    fn test_pinned_tooltip_survives_and_is_static() {
        let mut overlays = TooltipOverlays::new();
        let tooltip = overlays.create();
        let id = tooltip.id();
        overlays.pin(tooltip);

        let views = overlays.views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].class, TooltipClass::Static);

        assert!(overlays.unpin(id));
        assert!(overlays.is_empty());
    }

    #[test]
    fn test_follow_updates_text_and_anchor() {
        let mut overlays = TooltipOverlays::new();
        let tooltip = overlays.create();
        let geometry = ObservableGeometry::new(Geometry::LineString(vec![Point::ZERO]));
        let subscription = tooltip.follow(&geometry, MeasureMethod::Planar);

        geometry.set(Geometry::LineString(vec![Point::ZERO, Point::new(3.0, 4.0)]));
        assert_eq!(tooltip.text(), "5 m");
        assert_eq!(tooltip.position(), Some(Point::new(3.0, 4.0)));

        drop(subscription);
        geometry.set(Geometry::LineString(vec![Point::ZERO, Point::new(6.0, 8.0)]));
        assert_eq!(tooltip.text(), "5 m");
    }
}
