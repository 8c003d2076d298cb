//! Command loop driving a mounted map.

use crate::commands::{Command, CommandRegistry};
use crate::panel::TerminalPanel;
use mapdraw_core::format::format_xy;
use mapdraw_core::persistence::encode_feature;
use mapdraw_core::projection::{from_lon_lat, to_lon_lat};
use mapdraw_core::{
    ConfigError, Control, ControlEvent, ControlPanel, Feature, HostError, MapConfig, MapHost, NodeEdit,
    ScaleLineOptions, TooltipClass, Transport,
};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Mount error: {0}")]
    Host(#[from] HostError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Whether the loop continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The application: one map driven by line commands.
pub struct App<T: Transport> {
    host: MapHost<TerminalPanel, T>,
}

impl<T: Transport> App<T> {
    pub fn new(config: &MapConfig, transport: T) -> Result<Self, AppError> {
        let panel = TerminalPanel::new(config.scale);
        let host = MapHost::mount(config, panel, transport)?;
        Ok(Self { host })
    }

    pub fn host(&self) -> &MapHost<TerminalPanel, T> {
        &self.host
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> Result<(), AppError> {
        writeln!(output, "MapDraw - type 'help' for commands")?;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            self.host.poll_persistence();
            let flow = match Command::parse(&line) {
                Ok(command) => self.execute(command, &mut output)?,
                Err(e) => {
                    writeln!(output, "{}", e)?;
                    Flow::Continue
                }
            };
            output.flush()?;
            if flow == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command, writing its feedback to `out`.
    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            Command::Draw(kind) => {
                if !self.host.panel().is_enabled(Control::DrawType) {
                    writeln!(out, "Geometry type selector is disabled")?;
                    return Ok(Flow::Continue);
                }
                self.host.panel_mut().set_draw_selection(kind);
                self.host.handle_control(ControlEvent::DrawTypeChanged(kind));
                writeln!(out, "Mode: {}", self.host.mode())?;
            }
            Command::Measure => self.toggle(ControlEvent::MeasureToggled, out)?,
            Command::Modify => self.toggle(ControlEvent::ModifyToggled, out)?,
            Command::Click(at) => {
                self.host.click(from_lon_lat(at));
                if let Some(popup) = self.host.popup() {
                    writeln!(out, "{}", popup.content)?;
                }
            }
            Command::DoubleClick => self.host.double_click(),
            Command::Move(at) => self.host.pointer_move(from_lon_lat(at)),
            Command::Leave => self.host.pointer_leave(),
            Command::Down(at) => {
                if !self.host.pointer_down(from_lon_lat(at)) {
                    writeln!(out, "Nothing to grab")?;
                }
            }
            Command::Up => self.host.pointer_up(),
            Command::Select(index) => {
                let uid = self.host.layer().iter().nth(index).map(Feature::uid);
                match uid {
                    Some(uid) if self.host.select(uid) => writeln!(out, "Selected {}", index)?,
                    Some(_) => writeln!(out, "Selecting needs modify mode")?,
                    None => writeln!(out, "No feature {}", index)?,
                }
            }
            Command::RemoveVertex(index) => {
                if !self.host.edit_selection(NodeEdit::RemoveVertex(index)) {
                    writeln!(out, "Cannot remove vertex {}", index)?;
                }
            }
            Command::Undo => self.control(ControlEvent::UndoClicked, out)?,
            Command::Delete => self.control(ControlEvent::DeleteClicked, out)?,
            Command::Units(units) => {
                let options = ScaleLineOptions { units, ..self.host.scale_line().options };
                self.host.panel_mut().set_scale_options(options);
                self.control(ControlEvent::UnitsChanged(units), out)?;
            }
            Command::ScaleType(kind) => self.scale(ScaleLineOptions { kind, ..self.host.scale_line().options }, out)?,
            Command::Steps(steps) => self.scale(ScaleLineOptions { steps, ..self.host.scale_line().options }, out)?,
            Command::ScaleText(show_text) => {
                self.scale(ScaleLineOptions { show_text, ..self.host.scale_line().options }, out)?
            }
            Command::Invert(invert_colors) => {
                self.scale(ScaleLineOptions { invert_colors, ..self.host.scale_line().options }, out)?
            }
            Command::List => self.list(out)?,
            Command::Export => {
                for feature in self.host.layer().iter() {
                    match encode_feature(feature, feature.id) {
                        Ok(body) => writeln!(out, "{}", body)?,
                        Err(e) => writeln!(out, "{}: {}", feature.name, e)?,
                    }
                }
            }
            Command::Tooltips => {
                for tooltip in self.host.tooltips() {
                    let class = match tooltip.class {
                        TooltipClass::Static => "static",
                        TooltipClass::Measure => "measure",
                    };
                    match tooltip.position {
                        Some(at) => writeln!(out, "[{}] {} @ {}", class, tooltip.text, format_xy(to_lon_lat(at), 6))?,
                        None => writeln!(out, "[{}] (hidden)", class)?,
                    }
                }
            }
            Command::Status => self.status(out)?,
            Command::Sync => {
                let handled = self.host.poll_persistence();
                writeln!(out, "{} responses applied", handled)?;
            }
            Command::Help => writeln!(out, "{}", CommandRegistry::help_text())?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn control(&mut self, event: ControlEvent, out: &mut impl Write) -> io::Result<()> {
        if !self.host.panel().is_enabled(event.control()) {
            writeln!(out, "{:?} is disabled", event.control())?;
            return Ok(());
        }
        self.host.handle_control(event);
        Ok(())
    }

    fn toggle(&mut self, event: ControlEvent, out: &mut impl Write) -> io::Result<()> {
        self.control(event, out)?;
        writeln!(out, "Mode: {}", self.host.mode())
    }

    fn scale(&mut self, options: ScaleLineOptions, out: &mut impl Write) -> io::Result<()> {
        self.host.panel_mut().set_scale_options(options);
        self.control(ControlEvent::ScaleOptionsChanged(options), out)
    }

    fn list(&self, out: &mut impl Write) -> io::Result<()> {
        let selection = self.host.controller().modify().and_then(|modify| modify.selection());
        for (index, feature) in self.host.layer().iter().enumerate() {
            let id = feature.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            let marker = if selection == Some(feature.uid()) { "*" } else { " " };
            writeln!(
                out,
                "{}{}: {} [{}] id={} {} ({})",
                marker,
                index,
                feature.name,
                feature.kind(),
                id,
                feature.description,
                feature.style.summary()
            )?;
        }
        Ok(())
    }

    fn status(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Mode: {}", self.host.mode())?;
        writeln!(out, "Controls: {}", self.host.panel().summary())?;
        if let Some(position) = self.host.mouse_position() {
            writeln!(out, "Pointer: {}", position)?;
        }
        if let Some(reading) = self.host.scale_reading() {
            if reading.step_labels.is_empty() {
                writeln!(out, "Scale: {}", reading.label)?;
            } else {
                writeln!(out, "Scale: {}", reading.step_labels.join(" | "))?;
            }
            if let Some(text) = reading.scale_text {
                writeln!(out, "       {}", text)?;
            }
        }
        if let Some(segment) = self.host.measure_layer().segment() {
            writeln!(
                out,
                "Measured segment: {} vertices ({})",
                segment.geometry.vertices().len(),
                segment.style.summary()
            )?;
        }
        Ok(())
    }
}
