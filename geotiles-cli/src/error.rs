//! CLI error type.

use std::fmt;
use std::process::ExitCode;

use geotiles::config::ConfigError;
use geotiles::logging::LoggingError;
use geotiles::orchestrator::FetchError;
use geotiles::provider::ProviderError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem
    Config(String),
    /// Boundary file could not be read or parsed
    Boundary(String),
    /// Logging setup failed
    Logging(String),
    /// The tileset service could not be set up
    Provider(String),
    /// The fetch operation failed
    Fetch(FetchError),
    /// Cache inspection failed
    CacheStats(String),
    /// Cache cleanup failed
    CacheClear(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Boundary(msg) => write!(f, "Boundary error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Provider(msg) => write!(f, "Tileset service error: {}", msg),
            CliError::Fetch(e) => write!(f, "Fetch failed: {}", e),
            CliError::CacheStats(msg) => write!(f, "Failed to read cache: {}", msg),
            CliError::CacheClear(msg) => write!(f, "Failed to clear cache: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Prints the error and returns a failing exit code.
    pub fn exit(&self) -> ExitCode {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e.to_string())
    }
}
