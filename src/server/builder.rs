//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::build_catalog_routes;
use crate::core::service::CatalogService;
use crate::core::store::CatalogStore;
use anyhow::{Result, anyhow};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the catalog HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryCatalogStore::from_json_file("bikes.json")?)
///     .with_cors_origins(vec!["https://rpmvault.example".to_string()])
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn CatalogStore>>,
    cors_origins: Vec<String>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            cors_origins: vec!["*".to_string()],
            custom_routes: Vec::new(),
        }
    }

    /// Set the catalog store (required)
    pub fn with_store(mut self, store: impl CatalogStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared catalog store (required unless `with_store` is used)
    pub fn with_shared_store(mut self, store: Arc<dyn CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Allowed CORS origins; `*` allows any origin
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Add custom routes to the server
    ///
    /// Custom routes are merged before the catalog routes, so they must not
    /// declare a fallback.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final router with CORS and request tracing
    pub fn build(self) -> Result<Router> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("A catalog store is required. Call .with_store() first."))?;

        let state = AppState::new(CatalogService::new(store));

        let mut app = Router::new();
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }
        app = app.merge(build_catalog_routes(state));

        Ok(app
            .layer(build_cors_layer(&self.cors_origins))
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_store(store)
    ///     .serve("0.0.0.0:3001").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// CORS layer for the configured origins
///
/// An empty list or a `*` entry allows any origin. Origins that are not
/// valid header values are skipped with a warning.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::{CatalogItem, ItemId};
    use crate::core::predicate::Predicate;
    use crate::core::query::PageWindow;
    use crate::core::sort::SortSpec;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;

    struct EmptyStore;

    #[async_trait]
    impl CatalogStore for EmptyStore {
        async fn find(&self, _: &Predicate, _: &SortSpec, _: PageWindow) -> Result<Vec<CatalogItem>> {
            Ok(Vec::new())
        }

        async fn count(&self, _: &Predicate) -> Result<u64> {
            Ok(0)
        }

        async fn get(&self, _: &ItemId) -> Result<Option<CatalogItem>> {
            Ok(None)
        }

        async fn get_many(&self, _: &[ItemId]) -> Result<Vec<CatalogItem>> {
            Ok(Vec::new())
        }

        async fn brands(&self) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn categories(&self) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn request(uri: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_build_without_store_fails() {
        let err = ServerBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("catalog store is required"));
    }

    #[tokio::test]
    async fn test_any_origin_by_default() {
        let app = ServerBuilder::new().with_store(EmptyStore).build().unwrap();
        let response = app.oneshot(request("/health", "https://anywhere.example")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_configured_origins_only() {
        let app = ServerBuilder::new()
            .with_store(EmptyStore)
            .with_cors_origins(vec!["https://rpmvault.example".to_string()])
            .build()
            .unwrap();

        let allowed = app
            .clone()
            .oneshot(request("/health", "https://rpmvault.example"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://rpmvault.example"
        );

        let denied = app.oneshot(request("/health", "https://other.example")).await.unwrap();
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_custom_routes_are_merged() {
        let app = ServerBuilder::new()
            .with_store(EmptyStore)
            .with_custom_routes(Router::new().route("/version", get(|| async { "0.1.0" })))
            .build()
            .unwrap();

        let response = app.oneshot(request("/version", "https://a.example")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
