//! Configuration loader for pokemem
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::core::types::DataType;
use crate::memory::regions::{FilterCriteria, RegionFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// File looked for in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_process")]
    pub process: ProcessConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_regions")]
    pub regions: RegionsConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Target process handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// SIGSTOP the target for the duration of every memory access
    #[serde(default = "default_stop_while_accessing")]
    pub stop_while_accessing: bool,
}

/// Search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Bytes read per access during a search pass
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Candidates listed at most
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    #[serde(default = "default_type")]
    pub default_type: DataType,
}

/// Which mappings make up the searchable address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionsConfig {
    #[serde(default = "default_require_private")]
    pub require_private: bool,
    #[serde(default = "default_allow_executable")]
    pub allow_executable: bool,
}

impl RegionsConfig {
    /// Readable and writable mappings, narrowed by the two flags
    pub fn filter(&self) -> RegionFilter {
        let mut criteria = FilterCriteria::new().readable().writable();
        if self.require_private {
            criteria = criteria.private();
        }
        if !self.allow_executable {
            criteria = criteria.non_executable();
        }
        RegionFilter::new(criteria)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults if the file is missing
    /// or unusable
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => Config::default(),
            Err(e) => {
                warn!("ignoring {}: {}", self.config_path.display(), e);
                Config::default()
            }
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new(DEFAULT_CONFIG_FILE);
    match loader.load() {
        Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
        other => other,
    }
}

// Default functions for serde
fn default_process() -> ProcessConfig {
    ProcessConfig {
        stop_while_accessing: default_stop_while_accessing(),
    }
}

fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        chunk_size: defaults.scanner.chunk_size,
        result_limit: defaults.scanner.result_limit,
        default_type: defaults.scanner.default_type,
    }
}

fn default_regions() -> RegionsConfig {
    let defaults = default_config();
    RegionsConfig {
        require_private: defaults.regions.require_private,
        allow_executable: defaults.regions.allow_executable,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

// Individual field defaults
fn default_stop_while_accessing() -> bool {
    default_config().process.stop_while_accessing
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_result_limit() -> usize {
    default_config().scanner.result_limit
}

fn default_type() -> DataType {
    default_config().scanner.default_type
}

fn default_require_private() -> bool {
    default_config().regions.require_private
}

fn default_allow_executable() -> bool {
    default_config().regions.allow_executable
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            process: default_process(),
            scanner: default_scanner(),
            regions: default_regions(),
            logging: default_logging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::{MemoryRegion, Permissions};
    use crate::core::types::Address;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.process.stop_while_accessing);
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.scanner.default_type, DataType::U32);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[scanner\nchunk_size = ").unwrap();

        let loader = ConfigLoader::new(&config_path);
        assert!(matches!(loader.load(), Err(ConfigError::TomlParse(_))));
        assert_eq!(loader.load_or_default(), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.scanner.default_type = DataType::Utf16;
        config.process.stop_while_accessing = false;
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [scanner]
            chunk_size = 65536
            default_type = "f64"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scanner.chunk_size, 65536);
        assert_eq!(config.scanner.default_type, DataType::F64);
        // Check defaults are applied
        assert_eq!(config.scanner.result_limit, 100);
        assert!(config.process.stop_while_accessing);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_type_is_a_parse_error() {
        let toml_str = "[scanner]\ndefault_type = \"u128\"\n";
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_regions_filter() {
        let shared = MemoryRegion {
            permissions: "rw-s".parse::<Permissions>().unwrap(),
            ..MemoryRegion::new(Address::new(0x1000), 0x1000)
        };

        let config = Config::default();
        assert_eq!(config.regions.filter(), RegionFilter::default());
        assert!(!config.regions.filter().matches(&shared));

        let relaxed = RegionsConfig {
            require_private: false,
            allow_executable: true,
        };
        assert!(relaxed.filter().matches(&shared));
    }
}
