//! In-memory implementation of CatalogStore for testing and development

use crate::core::error::CatalogError;
use crate::core::item::{CatalogItem, ItemId};
use crate::core::predicate::Predicate;
use crate::core::query::PageWindow;
use crate::core::sort::SortSpec;
use crate::core::store::CatalogStore;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Contents of a seed file
///
/// Either a bare array of bike documents or an object with `bikes`,
/// `brands` and `categories` arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum CatalogSeed {
    Bikes(Vec<Value>),
    Full {
        #[serde(default)]
        bikes: Vec<Value>,
        #[serde(default)]
        brands: Vec<Value>,
        #[serde(default)]
        categories: Vec<Value>,
    },
    #[default]
    Empty,
}

/// A writer panicked while holding a lock; the data can no longer be trusted.
fn poisoned<T>(err: PoisonError<T>) -> anyhow::Error {
    anyhow::Error::new(CatalogError::Internal(format!("catalog lock poisoned: {}", err)))
}

/// In-memory catalog store
///
/// Evaluates predicate trees and sort specifications in process. Uses
/// RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    bikes: Arc<RwLock<Vec<CatalogItem>>>,
    brands: Arc<RwLock<Vec<Value>>>,
    categories: Arc<RwLock<Vec<Value>>>,
}

impl InMemoryCatalogStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON seed string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let seed: CatalogSeed = serde_json::from_str(json).context("Invalid catalog seed")?;
        let store = Self::new();

        let (bikes, brands, categories) = match seed {
            CatalogSeed::Bikes(bikes) => (bikes, Vec::new(), Vec::new()),
            CatalogSeed::Full {
                bikes,
                brands,
                categories,
            } => (bikes, brands, categories),
            CatalogSeed::Empty => Default::default(),
        };

        for doc in bikes {
            let item = CatalogItem::from_value(doc)
                .ok_or_else(|| anyhow!("Catalog seed bikes must be JSON objects"))?;
            store.insert(item)?;
        }
        store.set_brands(brands)?;
        store.set_categories(categories)?;

        Ok(store)
    }

    /// Load a store from a JSON seed file
    pub fn from_json_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog seed '{}'", path))?;
        let store = Self::from_json_str(&content)?;
        tracing::info!(path, bikes = store.len(), "loaded catalog seed");
        Ok(store)
    }

    /// Insert an item, assigning an identifier when it has none
    pub fn insert(&self, mut item: CatalogItem) -> Result<ItemId> {
        let id = match item.id() {
            Some(id) => id,
            None => {
                let id = ItemId::generate();
                item.set_id(id);
                id
            }
        };

        let mut bikes = self
            .bikes
            .write()
            .map_err(poisoned)?;

        if bikes.iter().any(|existing| existing.id() == Some(id)) {
            return Err(anyhow!("Bike with id '{}' already exists", id));
        }
        bikes.push(item);

        Ok(id)
    }

    pub fn set_brands(&self, brands: Vec<Value>) -> Result<()> {
        *self
            .brands
            .write()
            .map_err(poisoned)? = brands;
        Ok(())
    }

    pub fn set_categories(&self, categories: Vec<Value>) -> Result<()> {
        *self
            .categories
            .write()
            .map_err(poisoned)? = categories;
        Ok(())
    }

    /// Number of stored bikes
    pub fn len(&self) -> usize {
        self.bikes.read().map(|bikes| bikes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, predicate: &Predicate) -> Result<Vec<CatalogItem>> {
        let compiled = predicate
            .compile()
            .map_err(|e| {
                anyhow::Error::new(CatalogError::Internal(format!(
                    "Failed to compile predicate: {}",
                    e
                )))
            })?;

        let bikes = self
            .bikes
            .read()
            .map_err(poisoned)?;

        Ok(bikes
            .iter()
            .filter(|item| compiled.matches(item))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<CatalogItem>> {
        let mut items = self.matching(predicate)?;
        sort.sort(&mut items);
        Ok(window.slice(items))
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        Ok(self.matching(predicate)?.len() as u64)
    }

    async fn get(&self, id: &ItemId) -> Result<Option<CatalogItem>> {
        let bikes = self
            .bikes
            .read()
            .map_err(poisoned)?;

        Ok(bikes.iter().find(|item| item.id() == Some(*id)).cloned())
    }

    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>> {
        let wanted: HashSet<&ItemId> = ids.iter().collect();
        let bikes = self
            .bikes
            .read()
            .map_err(poisoned)?;

        Ok(bikes
            .iter()
            .filter(|item| item.id().is_some_and(|id| wanted.contains(&id)))
            .cloned()
            .collect())
    }

    async fn brands(&self) -> Result<Vec<Value>> {
        let brands = self
            .brands
            .read()
            .map_err(poisoned)?;
        Ok(brands.clone())
    }

    async fn categories(&self) -> Result<Vec<Value>> {
        let categories = self
            .categories
            .read()
            .map_err(poisoned)?;
        Ok(categories.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::criteria::SortMode;
    use crate::core::item::Attribute;
    use crate::core::predicate::FieldMatch;
    use crate::core::query::Paginator;
    use crate::core::sort::SortKeyResolver;
    use serde_json::json;

    fn seeded() -> InMemoryCatalogStore {
        InMemoryCatalogStore::from_json_str(
            &json!([
                {"Brand": "Honda", "Model": "CBR", "Year": "2020"},
                {"Brand": "Yamaha", "Model": "R1", "Year": "n/a"},
                {"brand": "Honda", "model": "Africa Twin", "year": 2018},
                {"brand": "KTM", "model": "390 Duke", "year": "2021"}
            ])
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_assigns_ids() {
        let store = seeded();
        assert_eq!(store.len(), 4);
        let all = store
            .find(
                &Predicate::All,
                &SortKeyResolver::resolve(SortMode::NameAsc),
                Paginator::window(1, 50),
            )
            .await
            .unwrap();
        assert!(all.iter().all(|item| item.id().is_some()));
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_windows() {
        let store = seeded();
        let predicate = Predicate::Match(FieldMatch::exact(Attribute::Brand, "honda"));
        let sort = SortKeyResolver::resolve(SortMode::YearDesc);

        let page = store.find(&predicate, &sort, Paginator::window(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text(Attribute::Model).as_deref(), Some("CBR"));

        let page = store.find(&predicate, &sort, Paginator::window(2, 1)).await.unwrap();
        assert_eq!(page[0].text(Attribute::Model).as_deref(), Some("Africa Twin"));

        assert_eq!(store.count(&predicate).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_and_get_many() {
        let store = InMemoryCatalogStore::new();
        let a = store
            .insert(CatalogItem::from_value(json!({"Brand": "BMW"})).unwrap())
            .unwrap();
        let b = store
            .insert(CatalogItem::from_value(json!({"Brand": "Ducati"})).unwrap())
            .unwrap();

        assert!(store.get(&a).await.unwrap().is_some());
        assert!(store.get(&ItemId::generate()).await.unwrap().is_none());

        let many = store.get_many(&[b, ItemId::generate()]).await.unwrap();
        assert_eq!(many.len(), 1);
        assert_eq!(many[0].id(), Some(b));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let store = InMemoryCatalogStore::new();
        let doc = json!({"_id": "65a1b2c3d4e5f60718293a4b", "Brand": "BMW"});
        store.insert(CatalogItem::from_value(doc.clone()).unwrap()).unwrap();
        assert!(store.insert(CatalogItem::from_value(doc).unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_full_seed_with_lookup_lists() {
        let store = InMemoryCatalogStore::from_json_str(
            r#"{"bikes": [{"Brand": "Honda"}], "brands": [{"name": "Honda"}], "categories": [{"category": "Sport"}]}"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.brands().await.unwrap().len(), 1);
        assert_eq!(store.categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_an_internal_error() {
        let store = seeded();
        let bikes = Arc::clone(&store.bikes);
        let _ = std::thread::spawn(move || {
            let _guard = bikes.write().unwrap();
            panic!("writer died");
        })
        .join();

        let err: CatalogError = store.count(&Predicate::All).await.unwrap_err().into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(matches!(err, CatalogError::Internal(_)));

        let err: CatalogError = store.get(&ItemId::generate()).await.unwrap_err().into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_seed_rejects_non_objects() {
        assert!(InMemoryCatalogStore::from_json_str("[1, 2]").is_err());
    }
}
