//! MCP (Model Context Protocol) route handlers
//!
//! Every request to the protocol endpoint gets its own [`McpSession`] from
//! the application state. The session is connected, serves the one message
//! and is closed again; if the client disconnects early the handler future
//! is dropped and the session's `Drop` performs the same teardown.
//!
//! [`McpSession`]: super::session::McpSession

use super::helpers::rpc_error;
use super::models::JsonRpcRequest;
use crate::error::McpError;
use crate::state::SharedState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{post, MethodRouter},
    Json, Router,
};
use futures_util::FutureExt;
use serde_json::Value;
use std::{any::Any, future::Future, panic::AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/mcp", endpoint())
        .route("/mcp/", endpoint()) // Trailing slash safety
}

fn endpoint() -> MethodRouter<SharedState> {
    post(handle_mcp)
        .get(handle_mcp_sse)
        .delete(handle_mcp_delete)
        .fallback(method_not_allowed)
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [
            (header::ALLOW, "GET, POST, DELETE"),
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        ],
        "Method Not Allowed",
    )
}

/// Handle SSE (Server-Sent Events) handshake for GET requests
async fn handle_mcp_sse() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        "event: endpoint\ndata: /mcp\n\n",
    )
}

/// Endpoint: DELETE /mcp
/// Sessions do not outlive their request, so there is nothing left to
/// terminate; the request still gets its own session like any other.
async fn handle_mcp_delete(State(state): State<SharedState>) -> StatusCode {
    let mut session = state.open_session();
    if let Err(err) = session.connect() {
        warn!(session = %session.id(), error = %err, "could not attach session");
    }
    session.close();
    StatusCode::OK
}

/// Endpoint: POST /mcp
/// Handles the Model Context Protocol communication for POST requests.
async fn handle_mcp(
    State(state): State<SharedState>,
    body: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(r)) => r,
        Err(e) => {
            warn!(error = %e.body_text(), "JSON parse error");
            let parse = McpError::Parse;
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(Value::Null, parse.code(), parse.to_string())),
            )
                .into_response();
        }
    };

    let mut session = state.open_session();
    if let Err(err) = session.connect() {
        error!(session = %session.id(), error = %err, "could not attach session");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
    }

    debug!(session = %session.id(), method = %request.method, "MCP call");

    let response = respond_or_recover(session.handle(request)).await;
    session.close();
    response
}

/// Drives one dispatch future to a response.
///
/// `Some(body)` becomes a 200 JSON reply and `None` a bodiless 202. A panic
/// while polling is contained here and answered with a plain-text 500.
pub async fn respond_or_recover<F>(dispatch: F) -> Response
where
    F: Future<Output = Option<Value>>,
{
    match AssertUnwindSafe(dispatch).catch_unwind().await {
        Ok(Some(body)) => Json(body).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(panic) => {
            error!(reason = %panic_reason(panic.as_ref()), "request handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
