//! Interaction mode controller.
//!
//! Exactly one session is alive at a time. Switching modes drops the previous
//! session, which releases its change subscription and unmounts its live
//! tooltip.

use crate::control::{Control, ControlPanel};
use crate::geometry::GeometryKind;
use crate::measure::MeasureMethod;
use crate::session::{DrawSession, MeasureSession, ModifySession};
use crate::tooltip::TooltipOverlays;
use std::fmt;

/// The interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Idle: clicks pick features for the info popup.
    #[default]
    None,
    Draw(GeometryKind),
    Measure,
    Modify,
}

impl Mode {
    /// Whether switching between `self` and `other` is refused.
    pub fn excludes(&self, other: &Mode) -> bool {
        matches!(
            (self, other),
            (Mode::Draw(_), Mode::Modify)
                | (Mode::Modify, Mode::Draw(_))
                | (Mode::Measure, Mode::Modify)
                | (Mode::Modify, Mode::Measure)
        )
    }

    /// Controls disabled while this mode is active.
    pub fn disabled_controls(&self) -> &'static [Control] {
        match self {
            Mode::None => &[Control::Undo, Control::Delete],
            Mode::Draw(_) | Mode::Measure => &[Control::Modify, Control::Delete],
            Mode::Modify => &[Control::DrawType, Control::Measure, Control::Undo, Control::Delete],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::None => f.write_str("None"),
            Mode::Draw(kind) => write!(f, "Draw({})", kind),
            Mode::Measure => f.write_str("Measure"),
            Mode::Modify => f.write_str("Modify"),
        }
    }
}

/// The session owned by the active mode.
#[derive(Debug, Default)]
pub enum ActiveSession {
    #[default]
    Idle,
    Draw(DrawSession),
    Measure(MeasureSession),
    Modify(ModifySession),
}

/// Owns the active session and gates mode transitions.
#[derive(Debug, Default)]
pub struct ModeController {
    session: ActiveSession,
    method: MeasureMethod,
}

impl ModeController {
    pub fn new(method: MeasureMethod) -> Self {
        Self {
            session: ActiveSession::Idle,
            method,
        }
    }

    pub fn mode(&self) -> Mode {
        match &self.session {
            ActiveSession::Idle => Mode::None,
            ActiveSession::Draw(draw) => Mode::Draw(draw.kind()),
            ActiveSession::Measure(_) => Mode::Measure,
            ActiveSession::Modify(_) => Mode::Modify,
        }
    }

    pub fn method(&self) -> MeasureMethod {
        self.method
    }

    pub fn session(&self) -> &ActiveSession {
        &self.session
    }

    pub fn draw_mut(&mut self) -> Option<&mut DrawSession> {
        match &mut self.session {
            ActiveSession::Draw(draw) => Some(draw),
            _ => None,
        }
    }

    pub fn measure_mut(&mut self) -> Option<&mut MeasureSession> {
        match &mut self.session {
            ActiveSession::Measure(measure) => Some(measure),
            _ => None,
        }
    }

    pub fn modify(&self) -> Option<&ModifySession> {
        match &self.session {
            ActiveSession::Modify(modify) => Some(modify),
            _ => None,
        }
    }

    pub fn modify_mut(&mut self) -> Option<&mut ModifySession> {
        match &mut self.session {
            ActiveSession::Modify(modify) => Some(modify),
            _ => None,
        }
    }

    /// Switch to `next`. Returns `false` when the switch is refused because
    /// the two modes are mutually exclusive.
    pub fn set_mode(
        &mut self,
        next: Mode,
        panel: &mut dyn ControlPanel,
        overlays: &mut TooltipOverlays,
    ) -> bool {
        let current = self.mode();
        if current == next {
            return true;
        }
        if current.excludes(&next) {
            log::debug!("Mode change {} -> {} refused", current, next);
            return false;
        }

        // Tear down first so the old tooltip is gone before the new one exists.
        self.session = ActiveSession::Idle;
        self.session = match next {
            Mode::None => ActiveSession::Idle,
            Mode::Draw(kind) => ActiveSession::Draw(DrawSession::new(kind, self.method, overlays)),
            Mode::Measure => ActiveSession::Measure(MeasureSession::new(self.method)),
            Mode::Modify => ActiveSession::Modify(ModifySession::new(self.method)),
        };
        self.sync_controls(panel, false);
        log::debug!("Mode {} -> {}", current, next);
        true
    }

    /// Apply the enablement policy of the current mode. In modify mode the
    /// Delete control follows `selection_has_id`.
    pub fn sync_controls(&self, panel: &mut dyn ControlPanel, selection_has_id: bool) {
        let mode = self.mode();
        let disabled = mode.disabled_controls();
        for control in Control::MODE_GATED {
            let enabled = !disabled.contains(&control)
                || (mode == Mode::Modify && control == Control::Delete && selection_has_id);
            panel.set_enabled(control, enabled);
        }
    }

    /// Drop the active session without touching controls.
    pub fn reset(&mut self) {
        self.session = ActiveSession::Idle;
    }
}
