//! MapDraw Application
//!
//! Terminal shell around the editing core: a line-based command interface
//! standing in for the toolbar and the pointer.

mod app;
mod commands;
mod panel;

pub use app::{App, AppError, Flow};
pub use commands::{Command, CommandError, CommandHelp, CommandRegistry};
pub use panel::TerminalPanel;
