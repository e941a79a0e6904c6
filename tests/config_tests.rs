//! Tests for loading configuration and seed files from disk

use rpmvault::config::{ServiceConfig, StorageBackend};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

fn path(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().to_string()
}

#[test]
fn test_load_yaml_file() {
    let file = write_temp(
        r#"
bind: "127.0.0.1:8088"
storage: mongodb
seed_path: /srv/bikes.json
cors_origins:
  - https://rpmvault.example
mongo:
  uri: mongodb://catalog-db:27017
  max_pool_size: 10
"#,
    );

    let config = ServiceConfig::from_yaml_file(&path(&file)).unwrap();

    assert_eq!(config.bind, "127.0.0.1:8088");
    assert_eq!(config.storage, StorageBackend::Mongodb);
    assert_eq!(config.seed_path.as_deref(), Some("/srv/bikes.json"));
    assert_eq!(config.cors_origins, ["https://rpmvault.example"]);
    assert_eq!(config.mongo.uri, "mongodb://catalog-db:27017");
    assert_eq!(config.mongo.max_pool_size, 10);
    assert_eq!(config.mongo.connect_timeout_ms, 5_000);
    assert_eq!(config.mongo.database, "rpm-vault-db");
}

#[test]
fn test_missing_file_names_the_path() {
    let err = ServiceConfig::from_yaml_file("/nonexistent/rpmvault.yaml").unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/rpmvault.yaml"));
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let file = write_temp("storage: [not, a, backend]\n");
    assert!(ServiceConfig::from_yaml_file(&path(&file)).is_err());
}

#[test]
fn test_unknown_backend_is_an_error() {
    let file = write_temp("storage: postgres\n");
    assert!(ServiceConfig::from_yaml_file(&path(&file)).is_err());
}

#[test]
fn test_env_overrides_win_over_file() {
    let file = write_temp("bind: \"127.0.0.1:8088\"\nseed_path: /srv/a.json\n");
    let vars: HashMap<String, String> = [
        ("RPMVAULT_BIND", "0.0.0.0:9000"),
        ("PORT", "7000"),
        ("RPMVAULT_SEED", "/srv/b.json"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = ServiceConfig::from_yaml_file(&path(&file))
        .unwrap()
        .with_overrides(&vars);

    assert_eq!(config.bind, "0.0.0.0:9000");
    assert_eq!(config.seed_path.as_deref(), Some("/srv/b.json"));
}

#[test]
fn test_blank_env_values_are_ignored() {
    let vars: HashMap<String, String> = [("MONGO_URI", "  "), ("PORT", "")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let config = ServiceConfig::default().with_overrides(&vars);

    assert_eq!(config, ServiceConfig::default());
}

#[cfg(feature = "in-memory")]
mod seed_tests {
    use super::*;
    use rpmvault::storage::InMemoryCatalogStore;

    #[test]
    fn test_seed_file_loads() {
        let file = write_temp(include_str!("fixtures/catalog.json"));
        let store = InMemoryCatalogStore::from_json_file(&path(&file)).unwrap();
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn test_bare_array_seed_file_loads() {
        let file = write_temp(r#"[{"Brand": "BMW", "Model": "R 1250 GS"}]"#);
        let store = InMemoryCatalogStore::from_json_file(&path(&file)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_seed_file_is_an_error() {
        let file = write_temp("{ not json");
        assert!(InMemoryCatalogStore::from_json_file(&path(&file)).is_err());
    }
}
