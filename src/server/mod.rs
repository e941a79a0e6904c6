//! HTTP server for the catalog
//!
//! `ServerBuilder` wires a [`CatalogStore`](crate::core::CatalogStore) into
//! the bike listing, lookup, brand/category and health routes, then layers
//! CORS and request tracing on top.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use router::build_catalog_routes;
