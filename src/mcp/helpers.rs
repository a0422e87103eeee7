//! MCP Protocol Helpers
//!
//! This module contains helper functions for JSON-RPC communication
//! and OpenAI widget metadata construction.

use serde_json::{json, Value};

/// Constructs the metadata required by the OpenAI widget system.
///
/// # Arguments
///
/// * `invoking` - Status line the host shows while the tool runs.
/// * `invoked` - Status line the host shows once the tool has finished.
pub fn widget_meta(invoking: &str, invoked: &str) -> Value {
    json!({
        "openai/outputTemplate": super::models::WIDGET_TEMPLATE_URI,
        "openai/toolInvocation/invoking": invoking,
        "openai/toolInvocation/invoked": invoked,
        "openai/widgetAccessible": true,
        "openai/resultCanProduceWidget": true,
    })
}

/// Widget metadata attached to resource descriptors.
pub fn resource_meta() -> Value {
    widget_meta("Loading shopping cart", "Shopping cart ready")
}

/// Builds a JSON-RPC 2.0 success response.
///
/// # Arguments
///
/// * `id` – The request identifier that must be echoed back.
/// * `result` – The payload representing the successful outcome.
///
/// # Returns
///
/// A `serde_json::Value` shaped as a JSON-RPC success envelope.
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC 2.0 error response.
///
/// # Arguments
///
/// * `id` – The request identifier (or `null` if unavailable).
/// * `code` – The JSON-RPC error code (e.g., -32601 for method not found).
/// * `message` – Human-readable description of the error.
///
/// # Returns
///
/// A `serde_json::Value` shaped as a JSON-RPC error envelope.
pub fn rpc_error(id: Value, code: i32, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}
