use anyhow::Result;
use rpmvault::config::{ServiceConfig, StorageBackend};
use rpmvault::core::CatalogStore;
use rpmvault::server::ServerBuilder;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Path of the YAML configuration file, when one is used
const CONFIG_ENV: &str = "RPMVAULT_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config()?;
    tracing::info!(bind = %config.bind, storage = ?config.storage, "Configuration loaded");

    let store = build_store(&config).await?;

    ServerBuilder::new()
        .with_shared_store(store)
        .with_cors_origins(config.cors_origins.clone())
        .serve(&config.bind)
        .await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> Result<ServiceConfig> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => ServiceConfig::from_yaml_file(&path)?,
        Err(_) => ServiceConfig::default(),
    };
    Ok(config.with_env_overrides())
}

async fn build_store(config: &ServiceConfig) -> Result<Arc<dyn CatalogStore>> {
    match config.storage {
        StorageBackend::Mongodb => mongo_store(config).await,
        StorageBackend::Memory => memory_store(config),
    }
}

#[cfg(feature = "mongodb_backend")]
async fn mongo_store(config: &ServiceConfig) -> Result<Arc<dyn CatalogStore>> {
    use anyhow::Context;

    let store = rpmvault::storage::MongoCatalogStore::connect(&config.mongo)
        .await
        .context("failed to configure MongoDB store")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongodb_backend"))]
async fn mongo_store(_config: &ServiceConfig) -> Result<Arc<dyn CatalogStore>> {
    anyhow::bail!("MongoDB storage requested but the `mongodb_backend` feature is not enabled")
}

#[cfg(feature = "in-memory")]
fn memory_store(config: &ServiceConfig) -> Result<Arc<dyn CatalogStore>> {
    use anyhow::Context;
    use rpmvault::storage::InMemoryCatalogStore;

    let store = match &config.seed_path {
        Some(path) => InMemoryCatalogStore::from_json_file(path)
            .with_context(|| format!("failed to seed in-memory store from '{}'", path))?,
        None => {
            tracing::warn!("No seed file configured, starting with an empty catalog");
            InMemoryCatalogStore::new()
        }
    };
    Ok(Arc::new(store))
}

#[cfg(not(feature = "in-memory"))]
fn memory_store(_config: &ServiceConfig) -> Result<Arc<dyn CatalogStore>> {
    anyhow::bail!("in-memory storage requested but the `in-memory` feature is not enabled")
}
