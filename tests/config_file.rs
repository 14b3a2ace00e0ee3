//! Loading console.yaml from disk.

use std::io::Write;
use std::time::Duration;

use rules_console::{ConfigError, ConsoleConfig};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "api:\n  base_url: http://rules.internal:8080/api\n  evaluate_timeout_secs: 4\nnotifications:\n  capacity: 3"
    )
    .unwrap();

    let config = ConsoleConfig::from_file(file.path()).unwrap();
    assert_eq!(config.api.base_url, "http://rules.internal:8080/api");
    assert_eq!(config.api.evaluate_timeout(), Duration::from_secs(4));
    assert_eq!(config.api.execute_timeout(), Duration::from_secs(8));
    assert_eq!(config.notifications.capacity, 3);
    assert_eq!(config.stub.port, 8080);
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("console.yaml");
    assert!(matches!(ConsoleConfig::from_file(&missing), Err(ConfigError::Io(_))));

    std::fs::write(&missing, "api: [not, a, map]").unwrap();
    assert!(matches!(ConsoleConfig::from_file(&missing), Err(ConfigError::Parse(_))));
}
