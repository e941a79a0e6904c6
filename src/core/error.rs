//! Typed error handling for the catalog service
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or out-of-range input, reported as 400
//! - [`CatalogError::NotFound`]: lookup by identifier with no match, 404
//! - [`StorageError`]: store connection or query failures, 500
//!
//! Storage and internal failures never echo their cause to the client. The
//! cause is logged server-side when the error is turned into a response.
//!
//! # Example
//!
//! ```rust,ignore
//! use rpmvault::prelude::*;
//!
//! match service.get(raw_id).await {
//!     Ok(bike) => println!("Found: {:?}", bike),
//!     Err(CatalogError::NotFound { id }) => println!("No bike {}", id),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Message returned to clients for any server-side failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while fetching bikes";

/// The main error type of the catalog service
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Invalid request input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No record with the given identifier
    #[error("Bike with id '{id}' not found")]
    NotFound { id: String },

    /// Store backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal failure (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level problems, present for validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldValidationError>>,
}

impl CatalogError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::NotFound { .. } => "BIKE_NOT_FOUND",
            CatalogError::Storage(e) => e.error_code(),
            CatalogError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the cause must stay server-side
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let message = if self.is_server_error() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            errors: match self {
                CatalogError::Validation(e) => Some(e.field_errors()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

/// Store results are `anyhow` errors. Backends attach a [`StorageError`] or a
/// [`CatalogError`] when they can classify the failure; anything else is a
/// query error.
impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<StorageError>() {
            Ok(storage) => return CatalogError::Storage(storage),
            Err(err) => err,
        };
        match err.downcast::<CatalogError>() {
            Ok(catalog) => catalog,
            Err(err) => CatalogError::Storage(StorageError::QueryError {
                message: format!("{:#}", err),
            }),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors related to input validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", join_fields(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Malformed item identifier
    #[error("Invalid bike id: {value}")]
    InvalidId { value: String },

    /// Malformed request body
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },
}

fn join_fields(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Flatten this error into a list of field-level problems
    pub fn field_errors(&self) -> Vec<FieldValidationError> {
        match self {
            ValidationError::FieldError { field, message } => {
                vec![FieldValidationError::new(field.clone(), message.clone())]
            }
            ValidationError::FieldErrors(errors) => errors.clone(),
            ValidationError::InvalidId { value } => vec![FieldValidationError::new(
                "id",
                format!("'{}' is not a valid bike id", value),
            )],
            ValidationError::InvalidBody { message } => {
                vec![FieldValidationError::new("body", message.clone())]
            }
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error
    #[error("Failed to connect to {backend}: {message}")]
    ConnectionError { backend: String, message: String },

    /// Query execution error
    #[error("Query error: {message}")]
    QueryError { message: String },

    /// Backend not available
    #[error("Storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::ConnectionError { .. } => "STORE_CONNECTION_ERROR",
            StorageError::QueryError { .. } => "STORE_QUERY_ERROR",
            StorageError::Unavailable { .. } => "STORE_UNAVAILABLE",
        }
    }
}
