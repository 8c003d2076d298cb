//! Control panel backed by terminal commands.

use mapdraw_core::{Control, ControlPanel, GeometryKind, ScaleLineOptions};
use std::collections::HashSet;

/// Selector values and button states of the terminal toolbar.
#[derive(Debug, Clone, Default)]
pub struct TerminalPanel {
    draw_selection: Option<GeometryKind>,
    scale_options: ScaleLineOptions,
    disabled: HashSet<Control>,
}

impl TerminalPanel {
    pub fn new(scale_options: ScaleLineOptions) -> Self {
        Self {
            scale_options,
            ..Self::default()
        }
    }

    pub fn set_draw_selection(&mut self, kind: Option<GeometryKind>) {
        self.draw_selection = kind;
    }

    pub fn set_scale_options(&mut self, options: ScaleLineOptions) {
        self.scale_options = options;
    }

    /// One-line summary of the button states, e.g. `draw:on modify:off`.
    pub fn summary(&self) -> String {
        Control::ALL
            .iter()
            .map(|control| {
                let state = if self.is_enabled(*control) { "on" } else { "off" };
                format!("{}:{}", label(*control), state)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn label(control: Control) -> &'static str {
    match control {
        Control::DrawType => "draw",
        Control::Units => "units",
        Control::ScaleOptions => "scale",
        Control::Measure => "measure",
        Control::Modify => "modify",
        Control::Undo => "undo",
        Control::Delete => "delete",
    }
}

impl ControlPanel for TerminalPanel {
    fn draw_selection(&self) -> Option<GeometryKind> {
        self.draw_selection
    }

    fn scale_options(&self) -> ScaleLineOptions {
        self.scale_options
    }

    fn set_enabled(&mut self, control: Control, enabled: bool) {
        let changed = if enabled {
            self.disabled.remove(&control)
        } else {
            self.disabled.insert(control)
        };
        if changed {
            log::debug!("Control {} {}", label(control), if enabled { "enabled" } else { "disabled" });
        }
    }

    fn is_enabled(&self, control: Control) -> bool {
        !self.disabled.contains(&control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reflects_state() {
        let mut panel = TerminalPanel::default();
        panel.set_enabled(Control::Undo, false);
        let summary = panel.summary();
        assert!(summary.contains("undo:off"));
        assert!(summary.contains("modify:on"));
    }
}
