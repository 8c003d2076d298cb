//! Control panel abstraction.
//!
//! The editing core reads the current selector values and toggles button
//! enablement through [`ControlPanel`]; the panel reports user changes back as
//! [`ControlEvent`]s.

use crate::geometry::GeometryKind;
use crate::scale::{ScaleLineOptions, ScaleUnits};
use std::collections::HashSet;

/// Controls the core reads or toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Geometry-kind selector (None, Point, LineString, Polygon, Circle).
    DrawType,
    /// Scale-line unit selector.
    Units,
    /// Scale-line type and bar options.
    ScaleOptions,
    Measure,
    Modify,
    Undo,
    Delete,
}

impl Control {
    pub const ALL: [Control; 7] = [
        Control::DrawType,
        Control::Units,
        Control::ScaleOptions,
        Control::Measure,
        Control::Modify,
        Control::Undo,
        Control::Delete,
    ];

    /// Controls whose enablement follows the interaction mode.
    pub const MODE_GATED: [Control; 5] = [
        Control::DrawType,
        Control::Measure,
        Control::Modify,
        Control::Undo,
        Control::Delete,
    ];
}

/// A user change reported by the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    DrawTypeChanged(Option<GeometryKind>),
    MeasureToggled,
    ModifyToggled,
    UndoClicked,
    DeleteClicked,
    UnitsChanged(ScaleUnits),
    ScaleOptionsChanged(ScaleLineOptions),
}

impl ControlEvent {
    /// The control that emitted the event.
    pub fn control(&self) -> Control {
        match self {
            ControlEvent::DrawTypeChanged(_) => Control::DrawType,
            ControlEvent::MeasureToggled => Control::Measure,
            ControlEvent::ModifyToggled => Control::Modify,
            ControlEvent::UndoClicked => Control::Undo,
            ControlEvent::DeleteClicked => Control::Delete,
            ControlEvent::UnitsChanged(_) => Control::Units,
            ControlEvent::ScaleOptionsChanged(_) => Control::ScaleOptions,
        }
    }
}

/// The UI surface the editing core depends on.
pub trait ControlPanel {
    /// Current geometry-kind selector value; `None` means no drawing.
    fn draw_selection(&self) -> Option<GeometryKind>;

    /// Current scale-line settings.
    fn scale_options(&self) -> ScaleLineOptions;

    fn set_enabled(&mut self, control: Control, enabled: bool);

    fn is_enabled(&self, control: Control) -> bool;

    /// Whether the control exists on this panel.
    fn has_control(&self, control: Control) -> bool {
        let _ = control;
        true
    }
}

/// Headless panel holding control state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryControlPanel {
    pub draw_selection: Option<GeometryKind>,
    pub scale_options: ScaleLineOptions,
    disabled: HashSet<Control>,
    missing: HashSet<Control>,
}

impl MemoryControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panel lacking `control`, for exercising mount validation.
    pub fn without(mut self, control: Control) -> Self {
        self.missing.insert(control);
        self
    }
}

impl ControlPanel for MemoryControlPanel {
    fn draw_selection(&self) -> Option<GeometryKind> {
        self.draw_selection
    }

    fn scale_options(&self) -> ScaleLineOptions {
        self.scale_options
    }

    fn set_enabled(&mut self, control: Control, enabled: bool) {
        if enabled {
            self.disabled.remove(&control);
        } else {
            self.disabled.insert(control);
        }
    }

    fn is_enabled(&self, control: Control) -> bool {
        !self.disabled.contains(&control)
    }

    fn has_control(&self, control: Control) -> bool {
        !self.missing.contains(&control)
    }
}
