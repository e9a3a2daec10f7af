use clap::Parser;
use dupfind::cli::Cli;
use dupfind::config::{ConfigError, Settings};
use figment::providers::Serialized;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Settings::default()));
    let settings: Settings = figment.extract().unwrap();

    assert_eq!(settings.io_threads, 4);
    assert!(settings.prehash);
    assert!(!settings.strict);
    assert!(settings.ignore_patterns.is_empty());
}

#[test]
fn test_config_file_then_cli() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
io_threads = 8
prehash = false
min_size = 10
ignore_patterns = ["*.bak"]
"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "dupfind",
        "--io-threads",
        "2",
        "--min-size",
        "1KB",
        "-i",
        "*.tmp",
    ])
    .unwrap();

    let settings = Settings::load_with_env(Some(&config_path), "DUPFIND_IT_FILE_CLI_")
        .unwrap()
        .with_cli_overrides(&cli);

    assert_eq!(settings.io_threads, 2);
    assert!(!settings.prehash);
    assert_eq!(settings.min_size, Some(1000));
    assert_eq!(settings.ignore_patterns, vec!["*.bak", "*.tmp"]);

    let walker = settings.walker_config();
    assert_eq!(walker.min_size, Some(1000));
    assert_eq!(walker.ignore_patterns.len(), 2);
}

#[test]
fn test_config_rejects_unknown_types() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = \"many\"\n").unwrap();

    let result = Settings::load_with_env(Some(&config_path), "DUPFIND_IT_BAD_TYPE_");

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_printed_config_loads_back() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let settings = Settings {
        io_threads: 6,
        skip_hidden: true,
        max_size: Some(4096),
        ignore_patterns: vec!["target/".to_string()],
        ..Default::default()
    };
    fs::write(&config_path, settings.to_toml().unwrap()).unwrap();

    let loaded = Settings::load_with_env(Some(&config_path), "DUPFIND_IT_ROUND_TRIP_").unwrap();
    assert_eq!(loaded, settings);
}
