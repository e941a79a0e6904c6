//! HTTP handlers for catalog operations
//!
//! Handlers stay thin: extraction and validation happen in extractors, the
//! query pipeline lives in [`CatalogService`], and every failure is a
//! [`CatalogError`] rendered by its `IntoResponse` impl.

use crate::core::error::{CatalogError, ValidationError};
use crate::core::item::CatalogItem;
use crate::core::query::PaginatedBikes;
use crate::core::service::CatalogService;
use crate::core::validation::ValidatedCriteria;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: CatalogService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }
}

/// `GET /bikes`
pub async fn list_bikes(
    State(state): State<AppState>,
    ValidatedCriteria(criteria): ValidatedCriteria,
) -> Result<Json<PaginatedBikes<CatalogItem>>, CatalogError> {
    let page = state.service.list(&criteria).await?;
    Ok(Json(page))
}

/// `GET /bikes/{id}`
pub async fn get_bike(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogItem>, CatalogError> {
    let item = state.service.get(&id).await?;
    Ok(Json(item))
}

/// `GET /bikes/by-ids`
///
/// The batch path shadows `/bikes/{id}`, so a GET on it is answered as a
/// lookup of the literal segment, which is never a valid id.
pub async fn get_bike_by_ids_segment(
    State(state): State<AppState>,
) -> Result<Json<CatalogItem>, CatalogError> {
    let item = state.service.get("by-ids").await?;
    Ok(Json(item))
}

/// `POST /bikes/by-ids`
pub async fn bikes_by_ids(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<CatalogItem>>, CatalogError> {
    let Json(body) = body.map_err(|e| ValidationError::InvalidBody {
        message: e.body_text(),
    })?;

    let items = state.service.get_many(&body).await?;
    Ok(Json(items))
}

/// `GET /brands`
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Value>>, CatalogError> {
    Ok(Json(state.service.brands().await?))
}

/// `GET /categories`
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, CatalogError> {
    Ok(Json(state.service.categories().await?))
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    Json(json!({
        "ok": true,
        "uptime_secs": uptime.num_seconds().max(0),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// Any route not matched by the catalog router
pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "ROUTE_NOT_FOUND",
            "message": format!("No route for {}", uri.path()),
        })),
    )
        .into_response()
}
