//! Store trait for catalog queries

use crate::core::item::{CatalogItem, ItemId};
use crate::core::predicate::Predicate;
use crate::core::query::PageWindow;
use crate::core::sort::SortSpec;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Document store holding the catalog
///
/// Implementations execute compiled predicate trees and sort specifications.
/// The framework is agnostic to the underlying storage mechanism; each
/// implementation owns its connection lifecycle.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Items matching `predicate`, ordered by `sort`, restricted to `window`
    ///
    /// Returned documents may still carry synthetic sort fields.
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<CatalogItem>>;

    /// Number of items matching `predicate`, ignoring any window
    async fn count(&self, predicate: &Predicate) -> Result<u64>;

    /// Get an item by identifier
    async fn get(&self, id: &ItemId) -> Result<Option<CatalogItem>>;

    /// Get every item whose identifier is in `ids`; unknown ids are skipped
    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>>;

    /// Documents of the brand lookup collection, as stored
    async fn brands(&self) -> Result<Vec<Value>>;

    /// Documents of the category lookup collection, as stored
    async fn categories(&self) -> Result<Vec<Value>>;
}
