//! Line commands and their help registry.

use kurbo::Point;
use mapdraw_core::{GeometryKind, ScaleLineKind, ScaleUnits};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid value '{0}'")]
    InvalidValue(String),
}

/// A parsed command line. Positions are `lon lat` in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Draw(Option<GeometryKind>),
    Measure,
    Modify,
    Click(Point),
    DoubleClick,
    Move(Point),
    Leave,
    Down(Point),
    Up,
    Select(usize),
    RemoveVertex(usize),
    Undo,
    Delete,
    Units(ScaleUnits),
    ScaleType(ScaleLineKind),
    Steps(u8),
    ScaleText(bool),
    Invert(bool),
    List,
    Export,
    Tooltips,
    Status,
    Sync,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Usage("<command> [args], try 'help'"));
        };
        let args: Vec<&str> = words.collect();
        let command = match name.to_ascii_lowercase().as_str() {
            "draw" => match args.as_slice() {
                [kind] if kind.eq_ignore_ascii_case("none") => Command::Draw(None),
                [kind] => Command::Draw(Some(
                    GeometryKind::parse(kind).ok_or_else(|| CommandError::InvalidValue(kind.to_string()))?,
                )),
                _ => return Err(CommandError::Usage("draw <none|point|linestring|polygon|circle>")),
            },
            "measure" => Command::Measure,
            "modify" => Command::Modify,
            "click" => Command::Click(position(&args, "click <lon> <lat>")?),
            "dblclick" => Command::DoubleClick,
            "move" => Command::Move(position(&args, "move <lon> <lat>")?),
            "leave" => Command::Leave,
            "down" => Command::Down(position(&args, "down <lon> <lat>")?),
            "up" => Command::Up,
            "select" => Command::Select(index(&args, "select <n>")?),
            "remove" => Command::RemoveVertex(index(&args, "remove <vertex>")?),
            "undo" => Command::Undo,
            "delete" => Command::Delete,
            "units" => match args.as_slice() {
                [units] => Command::Units(
                    ScaleUnits::parse(units).ok_or_else(|| CommandError::InvalidValue(units.to_string()))?,
                ),
                _ => return Err(CommandError::Usage("units <degrees|imperial|us|nautical|metric>")),
            },
            "scale" => match args.as_slice() {
                ["line"] => Command::ScaleType(ScaleLineKind::Line),
                ["bar"] => Command::ScaleType(ScaleLineKind::Bar),
                _ => return Err(CommandError::Usage("scale <line|bar>")),
            },
            "steps" => {
                let steps = index(&args, "steps <1-8>")?;
                match u8::try_from(steps) {
                    Ok(steps @ 1..=8) => Command::Steps(steps),
                    _ => return Err(CommandError::InvalidValue(steps.to_string())),
                }
            }
            "text" => Command::ScaleText(toggle(&args, "text <on|off>")?),
            "invert" => Command::Invert(toggle(&args, "invert <on|off>")?),
            "list" => Command::List,
            "export" => Command::Export,
            "tooltips" => Command::Tooltips,
            "status" => Command::Status,
            "sync" => Command::Sync,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn position(args: &[&str], usage: &'static str) -> Result<Point, CommandError> {
    let [lon, lat] = args else {
        return Err(CommandError::Usage(usage));
    };
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandError::InvalidValue(value.to_string()))
    };
    Ok(Point::new(parse(lon)?, parse(lat)?))
}

fn index(args: &[&str], usage: &'static str) -> Result<usize, CommandError> {
    let [value] = args else {
        return Err(CommandError::Usage(usage));
    };
    value
        .parse()
        .map_err(|_| CommandError::InvalidValue(value.to_string()))
}

fn toggle(args: &[&str], usage: &'static str) -> Result<bool, CommandError> {
    match args {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// Help line for a command.
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
}

impl CommandHelp {
    pub const fn new(usage: &'static str, description: &'static str) -> Self {
        Self { usage, description }
    }
}

/// Registry of all commands.
pub struct CommandRegistry;

impl CommandRegistry {
    pub fn all() -> Vec<CommandHelp> {
        vec![
            CommandHelp::new("draw <kind|none>", "Select the geometry type to draw"),
            CommandHelp::new("measure", "Toggle distance measurement"),
            CommandHelp::new("modify", "Toggle feature modification"),
            CommandHelp::new("click <lon> <lat>", "Click the map"),
            CommandHelp::new("dblclick", "Double click (finishes lines and polygons)"),
            CommandHelp::new("move <lon> <lat>", "Move the pointer (drags while a node is held)"),
            CommandHelp::new("leave", "Move the pointer off the map"),
            CommandHelp::new("down <lon> <lat>", "Press on a node of the selection"),
            CommandHelp::new("up", "Release the held node"),
            CommandHelp::new("select <n>", "Select the n-th listed feature"),
            CommandHelp::new("remove <vertex>", "Remove a vertex of the selection"),
            CommandHelp::new("undo", "Remove the last drawn point"),
            CommandHelp::new("delete", "Delete the selected stored feature"),
            CommandHelp::new("units <units>", "Scale line units"),
            CommandHelp::new("scale <line|bar>", "Scale line type"),
            CommandHelp::new("steps <1-8>", "Scale bar steps"),
            CommandHelp::new("text <on|off>", "Scale bar text"),
            CommandHelp::new("invert <on|off>", "Invert scale bar colors"),
            CommandHelp::new("list", "List features"),
            CommandHelp::new("export", "Print features as request bodies"),
            CommandHelp::new("tooltips", "List mounted tooltips"),
            CommandHelp::new("status", "Show mode, controls, pointer and scale"),
            CommandHelp::new("sync", "Apply finished server requests"),
            CommandHelp::new("quit", "Exit"),
        ]
    }

    /// Help text, one command per line.
    pub fn help_text() -> String {
        let width = Self::all().iter().map(|h| h.usage.len()).max().unwrap_or(0);
        Self::all()
            .iter()
            .map(|h| format!("  {:width$}  {}", h.usage, h.description, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
