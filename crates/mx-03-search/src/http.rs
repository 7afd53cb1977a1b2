//! # Search HTTP Surface
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /search/:id` | `200 {"redirect": path}`, `404 {"error": "not found"}`, `503 {"error": ..}` |
//! | `GET /health` | `200 {"status": "ok"}` |

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mx_telemetry::metrics::SEARCH_REQUESTS;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::domain::ResolveError;
use crate::service::IdentifierResolver;

/// Successful search body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub redirect: String,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
struct AppState {
    resolver: Arc<IdentifierResolver>,
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match self {
            ResolveError::NotFound => StatusCode::NOT_FOUND,
            ResolveError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the search router.
pub fn router(resolver: Arc<IdentifierResolver>, config: &SearchConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .route("/search/:id", get(search))
        .route("/health", get(health_check))
        .layer(middleware)
        .with_state(AppState { resolver })
}

/// Serve `router` on `listener` until `shutdown` turns true.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "[mx-03] search API listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            info!("[mx-03] Shutdown signal received");
        })
        .await
}

async fn search(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SearchResponse>, ResolveError> {
    match state.resolver.resolve(&id).await {
        Ok(target) => {
            SEARCH_REQUESTS
                .with_label_values(&[target.category.as_str()])
                .inc();
            Ok(Json(SearchResponse {
                redirect: target.redirect_path(),
            }))
        }
        Err(ResolveError::NotFound) => {
            SEARCH_REQUESTS.with_label_values(&["not_found"]).inc();
            Err(ResolveError::NotFound)
        }
        Err(e) => {
            SEARCH_REQUESTS.with_label_values(&["error"]).inc();
            warn!(id = %id, error = %e, "[mx-03] search failed");
            Err(e)
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "explorer-search",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
