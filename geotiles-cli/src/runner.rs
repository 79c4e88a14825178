//! Shared command setup: configuration and logging.

use geotiles::config::ConfigFile;
use geotiles::logging::{init_logging, LoggingConfig, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for one command run.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads the configuration file and installs logging.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let mut logging = LoggingConfig::from(&config.logging);
        if verbose {
            logging.level = "debug".to_string();
        }
        let guard = init_logging(&logging)?;

        Ok(Self {
            config,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = geotiles::VERSION,
            command,
            cache = %self.config.cache.directory.display(),
            "GeoTiles starting"
        );
    }
}
