//! Request validation
//!
//! Query parameters are trimmed and checked against declarative `validator`
//! rules, then normalized by the extractor before they reach the handlers.

pub mod extractor;
pub mod params;

pub use extractor::ValidatedCriteria;
pub use params::{BikeQueryParams, parse_saturating};
