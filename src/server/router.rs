//! Router builder for catalog routes

use crate::server::handlers::{
    AppState, bikes_by_ids, get_bike, get_bike_by_ids_segment, health_check, list_bikes,
    list_brands, list_categories, not_found,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the catalog routes
///
/// - GET /bikes - Filtered, sorted, paginated listing
/// - GET /bikes/{id} - Single bike by id
/// - POST /bikes/by-ids - Bikes for a list of ids (GET answers 400 like any bad id)
/// - GET /brands - Brand documents
/// - GET /categories - Distinct category names
/// - GET /health - Liveness and uptime
///
/// Unmatched routes answer `404 {code, message}`.
pub fn build_catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/bikes", get(list_bikes))
        .route(
            "/bikes/by-ids",
            post(bikes_by_ids).get(get_bike_by_ids_segment),
        )
        .route("/bikes/{id}", get(get_bike))
        .route("/brands", get(list_brands))
        .route("/categories", get(list_categories))
        .route("/health", get(health_check))
        .fallback(not_found)
        .with_state(state)
}
