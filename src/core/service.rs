//! Catalog query service
//!
//! Runs the listing pipeline: criteria → predicate tree and sort spec →
//! store execution with a page window and a separate total count →
//! projection. Lookups by identifier validate their input before the store
//! is touched.

use crate::core::criteria::FilterCriteria;
use crate::core::error::{CatalogError, ValidationError};
use crate::core::item::{CatalogItem, ItemId};
use crate::core::predicate::PredicateCompiler;
use crate::core::projection::ResultProjector;
use crate::core::query::{PaginatedBikes, Paginator};
use crate::core::sort::SortKeyResolver;
use crate::core::store::CatalogStore;
use serde_json::Value;
use std::sync::Arc;

/// Header row that some category imports carry as a document
const CATEGORY_HEADER: &str = "Category";

/// Query service over an injected [`CatalogStore`]
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// One page of matching items plus the total match count
    pub async fn list(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<PaginatedBikes<CatalogItem>, CatalogError> {
        let predicate = PredicateCompiler::compile(criteria);
        let sort = SortKeyResolver::resolve(criteria.sort());
        let window = Paginator::for_criteria(criteria);

        tracing::debug!(
            leaves = predicate.leaves().len(),
            sort = criteria.sort().as_str(),
            skip = window.skip,
            limit = window.limit,
            "listing bikes"
        );

        let (items, total) = tokio::try_join!(
            self.store.find(&predicate, &sort, window),
            self.store.count(&predicate),
        )?;

        Ok(PaginatedBikes::new(
            criteria,
            total,
            ResultProjector::project_all(items),
        ))
    }

    /// Single item by identifier
    pub async fn get(&self, raw_id: &str) -> Result<CatalogItem, CatalogError> {
        let id = ItemId::parse(raw_id).map_err(|_| ValidationError::InvalidId {
            value: raw_id.to_string(),
        })?;

        self.store
            .get(&id)
            .await?
            .map(ResultProjector::project)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })
    }

    /// Items for a `{ids: [...]}` body
    ///
    /// Malformed identifiers are dropped; a missing, empty or non-array `ids`
    /// is a validation failure.
    pub async fn get_many(&self, body: &Value) -> Result<Vec<CatalogItem>, CatalogError> {
        let raw_ids = match body.get("ids") {
            Some(Value::Array(ids)) if !ids.is_empty() => ids,
            _ => {
                return Err(ValidationError::FieldError {
                    field: "ids".to_string(),
                    message: "a non-empty array of ids is required".to_string(),
                }
                .into());
            }
        };

        let ids: Vec<ItemId> = raw_ids
            .iter()
            .filter_map(|raw| raw.as_str().and_then(|s| ItemId::parse(s).ok()))
            .collect();

        let dropped = raw_ids.len() - ids.len();
        if dropped > 0 {
            tracing::warn!(dropped, "ignoring malformed ids in batch lookup");
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.store.get_many(&ids).await?;
        Ok(ResultProjector::project_all(items))
    }

    /// Brand lookup documents with canonical identifiers
    pub async fn brands(&self) -> Result<Vec<Value>, CatalogError> {
        let documents = self.store.brands().await?;
        Ok(documents
            .into_iter()
            .filter_map(CatalogItem::from_value)
            .map(|item| Value::Object(ResultProjector::project(item).into_map()))
            .collect())
    }

    /// Sorted, de-duplicated category names
    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        let documents = self.store.categories().await?;
        let mut names: Vec<String> = documents
            .iter()
            .filter_map(|doc| doc.get("category").and_then(Value::as_str))
            .filter(|name| !name.is_empty() && *name != CATEGORY_HEADER)
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
