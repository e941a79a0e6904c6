//! Configuration loading and management
//!
//! Configuration is read from YAML (every field optional) and then
//! overridden by environment variables:
//!
//! | Variable         | Field                  |
//! |------------------|------------------------|
//! | `RPMVAULT_BIND`  | `bind`                 |
//! | `PORT`           | port part of `bind`    |
//! | `RPMVAULT_SEED`  | `seed_path`            |
//! | `MONGO_URI`      | `mongo.uri` (and selects the MongoDB backend) |
//! | `MONGO_DB`       | `mongo.database`       |
//! | `CORS_ORIGINS`   | `cors_origins` (comma-separated) |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which store backs the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

/// MongoDB connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub bikes_collection: String,
    pub brands_collection: String,
    pub categories_collection: String,
    /// Upper bound of pooled connections; requests wait when it is reached
    pub max_pool_size: u32,
    pub connect_timeout_ms: u64,
    /// How long a request waits for a usable server before failing
    pub server_selection_timeout_ms: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "rpm-vault-db".to_string(),
            bikes_collection: "allbikes".to_string(),
            brands_collection: "brands".to_string(),
            categories_collection: "categories".to_string(),
            max_pool_size: 50,
            connect_timeout_ms: 5_000,
            server_selection_timeout_ms: 30_000,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address
    pub bind: String,
    pub storage: StorageBackend,
    /// JSON file loaded into the in-memory store at startup
    pub seed_path: Option<String>,
    pub mongo: MongoConfig,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            storage: StorageBackend::Memory,
            seed_path: None,
            mongo: MongoConfig::default(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse config file '{}'", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(&std::env::vars().collect())
    }

    /// Apply overrides from a variable map
    pub fn with_overrides(mut self, vars: &HashMap<String, String>) -> Self {
        let var = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(bind) = var("RPMVAULT_BIND") {
            self.bind = bind;
        } else if let Some(port) = var("PORT") {
            let host = self
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.bind = format!("{}:{}", host, port);
        }
        if let Some(seed) = var("RPMVAULT_SEED") {
            self.seed_path = Some(seed);
        }
        if let Some(uri) = var("MONGO_URI") {
            self.mongo.uri = uri;
            self.storage = StorageBackend::Mongodb;
        }
        if let Some(database) = var("MONGO_DB") {
            self.mongo.database = database;
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        self
    }
}
