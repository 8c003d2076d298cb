//! Terminal entry point.

use clap::Parser;
use mapdraw_app::{App, AppError};
use mapdraw_core::{HttpTransport, MapConfig, MemoryTransport};
use std::io;
use std::path::PathBuf;

/// Draw, measure and edit map features from the terminal.
#[derive(Debug, Parser)]
#[command(name = "mapdraw", version, about, long_about = None)]
struct Args {
    /// Config file (defaults to `<config dir>/mapdraw/config.json`)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Keep features in memory instead of talking to the feature service
    #[arg(long)]
    offline: bool,
}

fn run(args: Args) -> Result<(), AppError> {
    let config = match args.config.or_else(MapConfig::default_path) {
        Some(path) => MapConfig::load_or_default(&path)?,
        None => MapConfig::default(),
    };
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    if args.offline {
        log::info!("Running offline, features are kept in memory");
        App::new(&config, MemoryTransport::assigning_ids())?.run(stdin, stdout)
    } else {
        let base = config.base_url()?;
        log::info!("Using feature service at {}", base);
        App::new(&config, HttpTransport::new(base))?.run(stdin, stdout)
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Starting MapDraw");

    if let Err(e) = run(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from(["mapdraw", "--config", "map.json", "--offline"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("map.json")));
        assert!(args.offline);

        assert!(Args::try_parse_from(["mapdraw", "--config"]).is_err());
        assert!(Args::try_parse_from(["mapdraw", "--fast"]).is_err());
    }
}
