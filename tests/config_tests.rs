//! 配置文件集成测试

use sparkify_etl::config::{Config, StoreBackend};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.input.songs_root, PathBuf::from("data/song_data"));
    assert_eq!(config.input.logs_root, PathBuf::from("data/log_data"));
    assert!(!config.input.skip_malformed_lines);
    assert_eq!(config.store.backend, StoreBackend::Postgres);
    assert!(config.store.skip_duplicate_keys);
    assert_eq!(config.store.duration_tolerance, 0.001);
    assert_eq!(config.store.postgres.database, "sparkifydb");
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_fills_defaults() {
    let config = Config::from_str(
        r#"
        [input]
        songs_root = "/data/songs"

        [store]
        backend = "sqlite"
        duration_tolerance = 0.0

        [store.sqlite]
        path = "/tmp/sparkify.db"
        "#,
    )
    .unwrap();

    assert_eq!(config.input.songs_root, PathBuf::from("/data/songs"));
    assert_eq!(config.input.logs_root, PathBuf::from("data/log_data"));
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.duration_tolerance, 0.0);
    assert_eq!(config.store.sqlite.path, "/tmp/sparkify.db");
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_postgres_section() {
    let config = Config::from_str(
        r#"
        [store.postgres]
        host = "db.internal"
        port = 6543
        user = "etl"
        password = "secret"
        "#,
    )
    .unwrap();

    let pg = &config.store.postgres;
    assert_eq!(pg.database, "sparkifydb");
    assert_eq!(pg.port, 6543);
    assert_eq!(pg.password, "secret");
    assert_eq!(pg.redacted(), "etl@db.internal:6543/sparkifydb");
}

#[test]
fn test_invalid_values_are_rejected() {
    let err = Config::from_str("[log]\nlevel = \"loud\"\n").unwrap_err();
    assert!(err.is_config_error());

    let err = Config::from_str("[store]\nduration_tolerance = -1.0\n").unwrap_err();
    assert!(err.is_config_error());

    let err = Config::from_str("[store]\nbackend = \"oracle\"\n").unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sparkify-etl.toml");

    let mut config = Config::default();
    config.store.backend = StoreBackend::Sqlite;
    config.input.skip_malformed_lines = true;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_or_default(&path).unwrap();
    assert_eq!(loaded.store.backend, StoreBackend::Sqlite);
    assert!(loaded.input.skip_malformed_lines);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.store.backend, StoreBackend::Postgres);
}
