//! Prometheus text exporter on the metrics port.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use mx_telemetry::{encode_metrics, metrics_content_type};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics))
}

async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, metrics_content_type())], body).into_response(),
        Err(e) => {
            warn!(error = %e, "[runtime] metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve `/metrics` on `listener` until `shutdown` turns true.
pub async fn serve(listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "[runtime] metrics listening");
    }
    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}
