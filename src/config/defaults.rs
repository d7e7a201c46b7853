//! Default configuration values for pokemem

use crate::core::types::DataType;
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub process: ProcessDefaults,
    pub scanner: ScannerDefaults,
    pub regions: RegionDefaults,
    pub logging: LoggingDefaults,
}

/// Default target process handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDefaults {
    pub stop_while_accessing: bool,
}

/// Default search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub chunk_size: usize,
    pub result_limit: usize,
    pub default_type: DataType,
}

/// Default region selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDefaults {
    pub require_private: bool,
    pub allow_executable: bool,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        process: ProcessDefaults {
            stop_while_accessing: true,
        },
        scanner: ScannerDefaults {
            chunk_size: 4096, // one page
            result_limit: 100,
            default_type: DataType::U32,
        },
        regions: RegionDefaults {
            require_private: true,
            allow_executable: false,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(config.process.stop_while_accessing);
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.scanner.result_limit, 100);
        assert_eq!(config.scanner.default_type, DataType::U32);
    }

    #[test]
    fn test_default_regions_are_rw_p() {
        let config = default_config();
        assert!(config.regions.require_private);
        assert!(!config.regions.allow_executable);
    }

    #[test]
    fn test_default_logging() {
        assert_eq!(default_config().logging.level, "info");
    }
}
