//! Core query compilation for the catalog

pub mod criteria;
pub mod error;
pub mod item;
pub mod predicate;
pub mod projection;
pub mod query;
pub mod service;
pub mod sort;
pub mod store;
pub mod validation;

pub use criteria::{FilterCriteria, FilterNormalizer, SortMode};
pub use error::{CatalogError, StorageError, ValidationError};
pub use item::{Attribute, CatalogItem, ItemId};
pub use predicate::{Predicate, PredicateCompiler};
pub use projection::ResultProjector;
pub use query::{PageWindow, PaginatedBikes, Paginator};
pub use service::CatalogService;
pub use sort::{SortKeyResolver, SortSpec};
pub use store::CatalogStore;
