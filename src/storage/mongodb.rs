//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoCatalogStore`, a [`CatalogStore`] backed by a
//! `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Query model
//!
//! A [`Predicate`] becomes a `$match` document where every leaf is an `$or`
//! over both field-name variants of its attribute. Sorting runs as an
//! aggregation: synthetic keys are added with `$addFields`, the page is cut
//! with `$skip`/`$limit`, and the synthetic keys are dropped again with
//! `$unset`. The total comes from a separate `count_documents` with the same
//! filter.
//!
//! Documents are returned as relaxed extended JSON, so `_id` arrives as
//! `{"$oid": "..."}` and is canonicalized by the projector.

use crate::config::MongoConfig;
use crate::core::error::StorageError;
use crate::core::item::{Attribute, CatalogItem, ID_FIELD, ItemId};
use crate::core::predicate::{FieldMatch, Predicate};
use crate::core::query::PageWindow;
use crate::core::sort::{NUMBER_PATTERN, SYNTHETIC_FIELDS, SortField, SortSpec};
use crate::core::store::CatalogStore;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use std::time::Duration;

const BACKEND: &str = "MongoDB";

// ---------------------------------------------------------------------------
// Query compilation
// ---------------------------------------------------------------------------

fn leaf_filter(leaf: &FieldMatch) -> Document {
    let pattern = leaf.pattern();
    let variants: Vec<Bson> = leaf
        .attribute
        .fields()
        .iter()
        .map(|field| {
            let mut condition = Document::new();
            condition.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
            Bson::Document(condition)
        })
        .collect();

    doc! { "$or": variants }
}

/// Translate a predicate tree into a `$match` filter document.
pub fn predicate_filter(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::All => doc! {},
        Predicate::Match(leaf) => leaf_filter(leaf),
        Predicate::And(children) => {
            let children: Vec<Bson> = children
                .iter()
                .map(|c| Bson::Document(predicate_filter(c)))
                .collect();
            doc! { "$and": children }
        }
        Predicate::Or(children) => {
            let children: Vec<Bson> = children
                .iter()
                .map(|c| Bson::Document(predicate_filter(c)))
                .collect();
            doc! { "$or": children }
        }
    }
}

/// `$ifNull` over both field-name variants, lowercase first.
fn attribute_expression(attribute: Attribute) -> Bson {
    let [field, legacy] = attribute.fields();
    Bson::Document(doc! {
        "$ifNull": [format!("${}", field), format!("${}", legacy), Bson::Null]
    })
}

/// First number in the attribute's text, `0` when there is none.
fn numeric_expression(attribute: Attribute) -> Document {
    let [field, legacy] = attribute.fields();
    doc! {
        "$toDouble": {
            "$let": {
                "vars": {
                    "found": {
                        "$regexFind": {
                            "input": {
                                "$convert": {
                                    "input": { "$ifNull": [format!("${}", field), format!("${}", legacy), ""] },
                                    "to": "string",
                                    "onError": "",
                                    "onNull": ""
                                }
                            },
                            "regex": NUMBER_PATTERN
                        }
                    }
                },
                "in": { "$ifNull": ["$$found.match", "0"] }
            }
        }
    }
}

/// `$addFields` stage computing the synthetic keys of a sort spec.
pub fn sort_fields(sort: &SortSpec) -> Document {
    let mut fields = Document::new();
    for key in sort.keys() {
        let Some(name) = key.field.synthetic_name() else {
            continue;
        };
        let expression = match key.field {
            SortField::Numeric(attribute) => Bson::Document(numeric_expression(attribute)),
            SortField::Text(attribute) => attribute_expression(attribute),
            SortField::Id => continue,
        };
        fields.insert(name, expression);
    }
    fields
}

/// `$sort` stage of a sort spec.
pub fn sort_document(sort: &SortSpec) -> Document {
    let mut order = Document::new();
    for key in sort.keys() {
        let name = key.field.synthetic_name().unwrap_or(ID_FIELD);
        order.insert(name, key.direction.as_i32());
    }
    order
}

/// Full aggregation pipeline for one listing page.
pub fn pipeline(predicate: &Predicate, sort: &SortSpec, window: PageWindow) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": predicate_filter(predicate) }];

    let fields = sort_fields(sort);
    let has_synthetic = !fields.is_empty();
    if has_synthetic {
        stages.push(doc! { "$addFields": fields });
    }

    stages.push(doc! { "$sort": sort_document(sort) });
    stages.push(doc! { "$skip": window.skip as i64 });
    stages.push(doc! { "$limit": window.limit as i64 });

    if has_synthetic {
        stages.push(doc! { "$unset": SYNTHETIC_FIELDS.to_vec() });
    }

    stages
}

fn document_to_item(doc: Document) -> Result<CatalogItem> {
    CatalogItem::from_value(Bson::Document(doc).into_relaxed_extjson())
        .ok_or_else(|| anyhow!("Expected BSON document, got non-object"))
}

/// Attach a [`StorageError`] to driver failures that mean the server could
/// not be reached, so they are reported apart from failing queries.
fn classify(err: mongodb::error::Error, action: &str) -> anyhow::Error {
    let storage = match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => StorageError::Unavailable {
            backend: BACKEND.to_string(),
        },
        ErrorKind::ConnectionPoolCleared { .. } | ErrorKind::Io(_) => {
            StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                message: err.to_string(),
            }
        }
        _ => return anyhow!("{}: {}", action, err),
    };
    tracing::warn!(error = %err, action, "MongoDB unreachable");
    anyhow::Error::new(storage).context(action.to_string())
}

fn object_id(id: &ItemId) -> ObjectId {
    ObjectId::from_bytes(id.bytes())
}

// ---------------------------------------------------------------------------
// MongoCatalogStore
// ---------------------------------------------------------------------------

/// Catalog store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use rpmvault::config::MongoConfig;
/// use rpmvault::storage::MongoCatalogStore;
///
/// let store = MongoCatalogStore::connect(&MongoConfig::default()).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoCatalogStore {
    database: Database,
    bikes_collection: String,
    brands_collection: String,
    categories_collection: String,
}

impl MongoCatalogStore {
    /// Create a store over an existing database handle with the default
    /// collection names.
    pub fn new(database: Database) -> Self {
        let defaults = MongoConfig::default();
        Self {
            database,
            bikes_collection: defaults.bikes_collection,
            brands_collection: defaults.brands_collection,
            categories_collection: defaults.categories_collection,
        }
    }

    /// Connect with a bounded pool and the configured timeouts.
    ///
    /// The driver connects lazily; the first query surfaces an unreachable
    /// server once the server selection timeout elapses.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .context("Invalid MongoDB connection string")?;
        options.max_pool_size = Some(config.max_pool_size);
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        options.app_name = Some("rpmvault".to_string());

        let client = Client::with_options(options).context("Failed to create MongoDB client")?;
        tracing::info!(
            database = %config.database,
            max_pool_size = config.max_pool_size,
            "configured MongoDB catalog store"
        );

        Ok(Self {
            database: client.database(&config.database),
            bikes_collection: config.bikes_collection.clone(),
            brands_collection: config.brands_collection.clone(),
            categories_collection: config.categories_collection.clone(),
        })
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn bikes(&self) -> Collection<Document> {
        self.database.collection(&self.bikes_collection)
    }

    async fn all_documents(&self, collection: &str) -> Result<Vec<Value>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(doc! {})
            .await
            .map_err(|e| classify(e, &format!("Failed to query '{}'", collection)))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, &format!("Failed to collect '{}'", collection)))?;

        Ok(docs
            .into_iter()
            .map(|d| Bson::Document(d).into_relaxed_extjson())
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<CatalogItem>> {
        let cursor = self
            .bikes()
            .aggregate(pipeline(predicate, sort, window))
            .await
            .map_err(|e| classify(e, "Failed to list bikes"))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, "Failed to collect bikes"))?;

        docs.into_iter().map(document_to_item).collect()
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        self.bikes()
            .count_documents(predicate_filter(predicate))
            .await
            .map_err(|e| classify(e, "Failed to count bikes"))
    }

    async fn get(&self, id: &ItemId) -> Result<Option<CatalogItem>> {
        let doc = self
            .bikes()
            .find_one(doc! { ID_FIELD: object_id(id) })
            .await
            .map_err(|e| classify(e, "Failed to get bike"))?;

        doc.map(document_to_item).transpose()
    }

    async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>> {
        let ids: Vec<Bson> = ids.iter().map(|id| Bson::ObjectId(object_id(id))).collect();

        let cursor = self
            .bikes()
            .find(doc! { ID_FIELD: { "$in": ids } })
            .await
            .map_err(|e| classify(e, "Failed to get bikes"))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, "Failed to collect bikes"))?;

        docs.into_iter().map(document_to_item).collect()
    }

    async fn brands(&self) -> Result<Vec<Value>> {
        self.all_documents(&self.brands_collection).await
    }

    async fn categories(&self) -> Result<Vec<Value>> {
        self.all_documents(&self.categories_collection).await
    }
}
