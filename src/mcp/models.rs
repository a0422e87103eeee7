//! MCP Protocol Models and Constants
//!
//! This module contains all data structures and constants related to the
//! Model Context Protocol (MCP) specification.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// =============================================================================
// MCP Constants
// =============================================================================

/// URI for the widget template
pub const WIDGET_TEMPLATE_URI: &str = "ui://widget/shopping-cart.html";
/// MIME type for the widget
pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";
/// Display name of the widget resource
pub const WIDGET_NAME: &str = "Shopping cart";
/// Server identifier
pub const SERVER_NAME: &str = "shopping-cart-mcp";
/// Server version reported during the handshake
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Protocol version for MCP
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// =============================================================================
// MCP Protocol Models
// =============================================================================

/// Standard JSON-RPC 2.0 Request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version (should be "2.0")
    pub jsonrpc: Option<String>,

    /// Method name to invoke
    pub method: String,

    /// Parameters for the method
    pub params: Option<Value>,

    /// Request identifier, absent for notifications.
    ///
    /// An explicit `"id": null` is kept as `Some(Value::Null)`: the sender
    /// expects a reply, only the member's absence marks a notification.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Builds a request carrying `id`.
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    /// A notification expects no reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}
