//! Loading, validating and applying configuration files

use pokemem::config::{validate_config, Config, ConfigError, ConfigLoader, MAX_CHUNK_SIZE};
use pokemem::memory::{MemoryRegion, Permissions};
use pokemem::{Address, DataType, MemoryOperations};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pokemem.toml");
    fs::write(
        &path,
        r#"
[process]
stop_while_accessing = false

[scanner]
chunk_size = 65536
result_limit = 20
default_type = "s16"

[regions]
require_private = false
allow_executable = true

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new(&path).load().unwrap();
    validate_config(&config).unwrap();
    assert!(!config.process.stop_while_accessing);
    assert_eq!(config.scanner.chunk_size, 65536);
    assert_eq!(config.scanner.result_limit, 20);
    assert_eq!(config.scanner.default_type, DataType::S16);
    assert_eq!(config.logging.level, "debug");

    let ops = MemoryOperations::from_config(1, &config);
    assert_eq!(ops.chunk_size(), 65536);
    assert!(!ops.target().stop_while_accessing());

    let code = MemoryRegion {
        permissions: "r-xp".parse::<Permissions>().unwrap(),
        ..MemoryRegion::new(Address::new(0x1000), 0x1000)
    };
    let shared = MemoryRegion {
        permissions: "rwxs".parse::<Permissions>().unwrap(),
        ..MemoryRegion::new(Address::new(0x2000), 0x1000)
    };
    let filter = config.regions.filter();
    assert!(!filter.matches(&code));
    assert!(filter.matches(&shared));
}

#[test]
fn test_empty_file_is_all_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    assert_eq!(ConfigLoader::new(&path).load().unwrap(), Config::default());
}

#[test]
fn test_invalid_values_fail_validation() {
    let mut config = Config::default();
    config.scanner.chunk_size = MAX_CHUNK_SIZE * 4;
    assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));

    let mut config = Config::default();
    config.logging.level = "loud".to_string();
    assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new(dir.path().join("saved.toml"));

    let mut config = Config::default();
    config.scanner.default_type = DataType::Ascii;
    config.regions.allow_executable = true;
    loader.save(&config).unwrap();

    let text = fs::read_to_string(loader.path()).unwrap();
    assert!(text.contains("default_type = \"ascii\""));
    assert_eq!(loader.load().unwrap(), config);
}
