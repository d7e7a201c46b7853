//! Configuration module for pokemem
//!
//! Provides configuration loading, validation, and default settings
//! for the engine and the command-line driver.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use validator::{validate_config, ConfigValidator, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

// Re-export the main configuration structure
pub use loader::{Config, LoggingConfig, ProcessConfig, RegionsConfig, ScannerConfig};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
