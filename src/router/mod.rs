//! Routing module for the shopping cart application

use crate::state::SharedState;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, StatusCode},
    middleware::Next,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Creates and configures the application router with all routes and middleware
pub fn create_app_router(state: SharedState) -> Router {
    // Middleware: Log requests
    let log_layer = axum::middleware::from_fn(|req: Request<Body>, next: Next| async move {
        let method = req.method().clone();
        let uri = req.uri().clone();
        info!(%method, %uri, "request");
        let res = next.run(req).await;
        if !res.status().is_success() {
            warn!(%method, %uri, status = %res.status(), "request did not succeed");
        }
        res
    });

    // Middleware: CORS (Permissive, answers pre-flight requests)
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("mcp-session-id")]);

    // Routes
    Router::new()
        .route("/", get(banner))
        .merge(crate::mcp::routes())
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(cors_layer).layer(log_layer))
        .with_state(state)
}

/// Endpoint: GET /
async fn banner() -> &'static str {
    "Shopping cart MCP server"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
