//! INI configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;

use super::keys::ConfigKey;
use super::ConfigError;
use crate::download::{DownloadPolicy, OverflowPolicy, DEFAULT_PROBE_THRESHOLD};
use crate::provider::GOOGLE_TILES_ROOT;

/// Name of the per-user directory holding configuration and cache.
const APP_DIR: &str = ".geotiles";

/// Per-user application directory, `~/.geotiles`.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Location of the configuration file.
pub fn config_file_path() -> PathBuf {
    app_dir().join("config.ini")
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub root_url: String,
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    /// Byte budget per request; 0 is unbounded.
    pub budget: u64,
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub parallel: usize,
    pub probe_threshold: f64,
    pub on_overflow: OverflowPolicy,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for a log file, if file logging is wanted.
    pub directory: Option<PathBuf>,
}

/// The user's configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            provider: ProviderSettings {
                api_key: None,
                root_url: GOOGLE_TILES_ROOT.to_string(),
                timeout: 30,
            },
            cache: CacheSettings {
                directory: app_dir().join("cache"),
                budget: 0,
            },
            download: DownloadSettings {
                parallel: 1,
                probe_threshold: DEFAULT_PROBE_THRESHOLD,
                on_overflow: OverflowPolicy::Stop,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}

impl ConfigFile {
    /// Loads the configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the configuration from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Saves the configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Saves the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path)?;
        Ok(())
    }

    /// Download policy described by the `[download]` section.
    pub fn download_policy(&self) -> DownloadPolicy {
        DownloadPolicy::default()
            .with_parallel(self.download.parallel)
            .with_probe_threshold(self.download.probe_threshold)
            .with_overflow(self.download.on_overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_sections() {
        let config = ConfigFile::parse(
            "[provider]\napi_key = abc\ntimeout = 10\n\n[cache]\nbudget = 500MB\ndirectory = /tmp/tiles\n\n[download]\nparallel = 4\non_overflow = skip\n\n[unknown]\nfoo = bar\n",
        )
        .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("abc"));
        assert_eq!(config.provider.timeout, 10);
        assert_eq!(config.cache.budget, 500 * 1024 * 1024);
        assert_eq!(config.cache.directory, PathBuf::from("/tmp/tiles"));
        assert_eq!(config.download.parallel, 4);
        assert_eq!(config.download.on_overflow, OverflowPolicy::SkipAndContinue);
        assert_eq!(config.provider.root_url, GOOGLE_TILES_ROOT);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigFile::parse("[download]\nparallel = many\n").unwrap_err();
        assert!(err.to_string().contains("download.parallel"), "{}", err);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");
        let mut config = ConfigFile::default();
        config.provider.api_key = Some("secret".to_string());
        config.cache.budget = 2048;
        config.download.probe_threshold = 0.5;
        config.logging.directory = Some(temp.path().join("logs"));

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_download_policy() {
        let mut config = ConfigFile::default();
        config.download.parallel = 3;
        config.download.on_overflow = OverflowPolicy::SkipAndContinue;

        let policy = config.download_policy();
        assert_eq!(policy.parallel, 3);
        assert_eq!(policy.overflow, OverflowPolicy::SkipAndContinue);
    }
}
