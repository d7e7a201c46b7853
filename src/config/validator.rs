//! Configuration validator for pokemem
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ScannerConfig};

/// Smallest chunk a search pass may read at once
pub const MIN_CHUNK_SIZE: usize = 64;
/// Largest chunk a search pass may read at once
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        // Chunks must split every region into whole items of every width
        if !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&scanner.chunk_size) {
            return Err(ConfigError::Invalid(format!(
                "Chunk size must be between {} and {} bytes",
                MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
            )));
        }

        if scanner.result_limit == 0 {
            return Err(ConfigError::Invalid(
                "Result limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_chunk_size_not_power_of_two() {
        let mut config = Config::default();
        config.scanner.chunk_size = 3000;
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("power of 2"));

        config.scanner.chunk_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_chunk_size_bounds() {
        let mut config = Config::default();
        config.scanner.chunk_size = 32;
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = MIN_CHUNK_SIZE;
        assert!(validate_config(&config).is_ok());

        config.scanner.chunk_size = MAX_CHUNK_SIZE;
        assert!(validate_config(&config).is_ok());

        config.scanner.chunk_size = MAX_CHUNK_SIZE * 2;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_result_limit() {
        let mut config = Config::default();
        config.scanner.result_limit = 0;
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("Result limit"));
    }

    #[test]
    fn test_log_levels() {
        let mut config = Config::default();
        for level in ["trace", "DEBUG", "Info", "warn", "error", "off"] {
            config.logging.level = level.to_string();
            assert!(validate_config(&config).is_ok(), "{level}");
        }

        config.logging.level = "verbose".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }
}
