//! Dotted configuration keys for `config get` and `config set`.

use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFile;
use super::size::parse_size;
use super::ConfigError;

/// A single configuration setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ProviderApiKey,
    ProviderRootUrl,
    ProviderTimeout,
    CacheDirectory,
    CacheBudget,
    DownloadParallel,
    DownloadProbeThreshold,
    DownloadOnOverflow,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 10] = [
    ConfigKey::ProviderApiKey,
    ConfigKey::ProviderRootUrl,
    ConfigKey::ProviderTimeout,
    ConfigKey::CacheDirectory,
    ConfigKey::CacheBudget,
    ConfigKey::DownloadParallel,
    ConfigKey::DownloadProbeThreshold,
    ConfigKey::DownloadOnOverflow,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ProviderApiKey | ConfigKey::ProviderRootUrl | ConfigKey::ProviderTimeout => {
                "provider"
            }
            ConfigKey::CacheDirectory | ConfigKey::CacheBudget => "cache",
            ConfigKey::DownloadParallel
            | ConfigKey::DownloadProbeThreshold
            | ConfigKey::DownloadOnOverflow => "download",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ProviderApiKey => "api_key",
            ConfigKey::ProviderRootUrl => "root_url",
            ConfigKey::ProviderTimeout => "timeout",
            ConfigKey::CacheDirectory => "directory",
            ConfigKey::CacheBudget => "budget",
            ConfigKey::DownloadParallel => "parallel",
            ConfigKey::DownloadProbeThreshold => "probe_threshold",
            ConfigKey::DownloadOnOverflow => "on_overflow",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Dotted name, e.g. `cache.budget`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ProviderApiKey => config.provider.api_key.clone().unwrap_or_default(),
            ConfigKey::ProviderRootUrl => config.provider.root_url.clone(),
            ConfigKey::ProviderTimeout => config.provider.timeout.to_string(),
            ConfigKey::CacheDirectory => config.cache.directory.display().to_string(),
            ConfigKey::CacheBudget => config.cache.budget.to_string(),
            ConfigKey::DownloadParallel => config.download.parallel.to_string(),
            ConfigKey::DownloadProbeThreshold => config.download.probe_threshold.to_string(),
            ConfigKey::DownloadOnOverflow => config.download.on_overflow.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parses `value` into `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason,
        };

        match self {
            ConfigKey::ProviderApiKey => {
                config.provider.api_key = (!value.is_empty()).then(|| value.to_string());
            }
            ConfigKey::ProviderRootUrl => {
                if value.is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                config.provider.root_url = value.to_string();
            }
            ConfigKey::ProviderTimeout => {
                config.provider.timeout = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            }
            ConfigKey::CacheDirectory => {
                if value.is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                config.cache.directory = expand_tilde(value);
            }
            ConfigKey::CacheBudget => {
                config.cache.budget = parse_size(value).map_err(|e| invalid(e.to_string()))?;
            }
            ConfigKey::DownloadParallel => {
                let parallel: usize = value.parse().map_err(|e| invalid(format!("{}", e)))?;
                if parallel == 0 {
                    return Err(invalid("must be at least 1".to_string()));
                }
                config.download.parallel = parallel;
            }
            ConfigKey::DownloadProbeThreshold => {
                let threshold: f64 = value.parse().map_err(|e| invalid(format!("{}", e)))?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(invalid("must be between 0 and 1".to_string()));
                }
                config.download.probe_threshold = threshold;
            }
            ConfigKey::DownloadOnOverflow => {
                config.download.on_overflow = value.parse().map_err(invalid)?;
            }
            ConfigKey::LoggingLevel => {
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| expand_tilde(value));
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
