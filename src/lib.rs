//! # RPM Vault
//!
//! A read-mostly HTTP API over a motorcycle catalog.
//!
//! ## Features
//!
//! - **Filtered listings**: brand/category lists, model and free-text search,
//!   all literal and case-insensitive
//! - **Deterministic sorting**: numeric keys pulled out of free text
//!   (`"650cc"` → 650) with a total tie-break, so pages never overlap
//! - **Dual schema**: records using `brand` or `Brand` field names are
//!   matched and sorted alike
//! - **Pluggable stores**: in-memory (default) or MongoDB (`mongodb_backend`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rpmvault::prelude::*;
//!
//! let store = InMemoryCatalogStore::from_json_file("bikes.json")?;
//! ServerBuilder::new()
//!     .with_store(store)
//!     .serve("0.0.0.0:3001")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Query pipeline ===
    pub use crate::core::{
        Attribute, CatalogItem, CatalogService, FilterCriteria, FilterNormalizer, ItemId,
        PageWindow, PaginatedBikes, Paginator, Predicate, PredicateCompiler, ResultProjector,
        SortKeyResolver, SortMode, SortSpec,
    };

    // === Errors ===
    pub use crate::core::{CatalogError, StorageError, ValidationError};

    // === Storage ===
    pub use crate::core::CatalogStore;
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryCatalogStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoCatalogStore;

    // === Server ===
    pub use crate::config::{MongoConfig, ServiceConfig, StorageBackend};
    pub use crate::server::ServerBuilder;
}
