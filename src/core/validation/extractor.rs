//! Axum extractor for validated listing criteria
//!
//! This module provides the `ValidatedCriteria` extractor that parses,
//! validates and normalizes the `GET /bikes` query string before the
//! handler runs. Failures never reach the store.

use crate::core::criteria::{FilterCriteria, FilterNormalizer};
use crate::core::error::{CatalogError, ValidationError};
use crate::core::validation::BikeQueryParams;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

/// Axum extractor producing [`FilterCriteria`]
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn list_bikes(
///     ValidatedCriteria(criteria): ValidatedCriteria,
/// ) -> Result<Json<PaginatedBikes<CatalogItem>>, CatalogError> {
///     // criteria is already validated and normalized!
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedCriteria(pub FilterCriteria);

impl ValidatedCriteria {
    /// Get the inner criteria
    pub fn into_inner(self) -> FilterCriteria {
        self.0
    }
}

impl std::ops::Deref for ValidatedCriteria {
    type Target = FilterCriteria;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ValidatedCriteria
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<BikeQueryParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ValidationError::FieldError {
                field: "query".to_string(),
                message: e.body_text(),
            })?;

        let criteria = FilterNormalizer::normalize(&params)?;
        Ok(Self(criteria))
    }
}
