use std::error::Error;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

/// Installs the global logger. Terminal only through `env_logger` (honours `RUST_LOG`), or
/// terminal plus file through `simplelog` when `log_file` is set.
pub fn init(log_file: Option<&Path>, level: LevelFilter) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("creating log file {}: {e}", path.display()))?;
            let config = simplelog::Config::default();
            CombinedLogger::init(vec![
                TermLogger::new(
                    level,
                    config.clone(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(level, config, file),
            ])?;
        }
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_env("RUST_LOG")
                .try_init()?;
        }
    }
    Ok(())
}
