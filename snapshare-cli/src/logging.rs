use log::LevelFilter;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Logging configuration for the SnapShare CLI
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for messages written to stderr
    pub level: LevelFilter,
    /// Optional file that receives everything at debug level
    pub log_file: Option<PathBuf>,
    /// Whether to truncate the log file on startup
    pub clear_on_startup: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            log_file: None,
            clear_on_startup: true,
        }
    }
}

impl LogConfig {
    /// `--verbose` raises terminal output from warnings to debug
    pub fn from_verbosity(verbose: bool) -> Self {
        Self {
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Warn
            },
            ..Default::default()
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        config.level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = &config.log_file {
        let file = if config.clear_on_startup {
            File::create(path)?
        } else {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?
        };
        loggers.push(WriteLogger::new(LevelFilter::Debug, log_config, file));
    }

    CombinedLogger::init(loggers)?;

    log::debug!(
        "Logging initialized: level={:?}, file={:?}",
        config.level,
        config.log_file
    );
    Ok(())
}
