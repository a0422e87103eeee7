//! Protocol sessions.
//!
//! A [`McpSession`] lives for exactly one transport connection:
//!
//! ```text
//! Created --connect--> Connected --request--> Serving(n) --reply--> Connected
//!                          |                      |
//!                          +-------close----------+--> Closed
//! ```
//!
//! `n` counts calls in flight. Closing (explicitly or by dropping the
//! session when the connection goes away) refuses further calls; a call that
//! already mutated the cart keeps its effect.

use super::helpers::{rpc_error, rpc_success};
use super::models::{JsonRpcRequest, PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use super::tools::ToolRegistry;
use crate::error::{McpError, Result, SessionError};
use crate::state::SessionTable;
use crate::ui::{self, WidgetAssets};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Connected,
    Serving(usize),
    Closed,
}

/// One protocol session bound to a tool registry.
#[derive(Debug)]
pub struct McpSession {
    id: Uuid,
    state: SessionState,
    registry: ToolRegistry,
    assets: WidgetAssets,
    table: Option<Arc<SessionTable>>,
}

impl McpSession {
    /// Creates an unattached session.
    pub fn new(registry: ToolRegistry, assets: WidgetAssets) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Created,
            registry,
            assets,
            table: None,
        }
    }

    /// Releases the session from `table` when it closes.
    pub fn tracked_by(mut self, table: Arc<SessionTable>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Attaches the session to its transport. Allowed once.
    pub fn connect(&mut self) -> std::result::Result<(), SessionError> {
        match self.state {
            SessionState::Created => {
                self.state = SessionState::Connected;
                debug!(session = %self.id, "session connected");
                Ok(())
            }
            SessionState::Connected | SessionState::Serving(_) => {
                Err(SessionError::AlreadyConnected)
            }
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    /// Tears the session down. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        match self.table.as_ref().and_then(|t| t.release(&self.id)) {
            Some(info) => debug!(
                session = %self.id,
                scope = ?info.scope,
                open_for = ?info.open_for(),
                "session closed"
            ),
            None => debug!(session = %self.id, "untracked session closed"),
        }
    }

    /// Handles one JSON-RPC message.
    ///
    /// Returns the response envelope, or `None` for notifications. Protocol
    /// failures are rendered as JSON-RPC errors; tool-level problems are
    /// already ordinary tool results by the time they get here.
    #[instrument(skip_all, fields(session = %self.id, method = %request.method))]
    pub async fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
        let notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);

        let outcome = match self.begin() {
            Ok(()) => {
                let outcome = self.dispatch(&request).await;
                self.finish();
                outcome
            }
            Err(err) => Err(err.into()),
        };

        if notification {
            if let Err(err) = outcome {
                warn!(error = %err, "notification failed");
            }
            return None;
        }

        Some(match outcome {
            Ok(result) => rpc_success(id, result),
            Err(err) => {
                warn!(code = err.code(), error = %err, "request failed");
                rpc_error(id, err.code(), err.to_string())
            }
        })
    }

    fn begin(&mut self) -> std::result::Result<(), SessionError> {
        self.state = match self.state {
            SessionState::Connected => SessionState::Serving(1),
            SessionState::Serving(n) => SessionState::Serving(n + 1),
            SessionState::Created => return Err(SessionError::NotConnected),
            SessionState::Closed => return Err(SessionError::Closed),
        };
        Ok(())
    }

    fn finish(&mut self) {
        self.state = match self.state {
            SessionState::Serving(1) => SessionState::Connected,
            SessionState::Serving(n) => SessionState::Serving(n - 1),
            other => other,
        };
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value> {
        if let Some(version) = request.jsonrpc.as_deref() {
            if version != "2.0" {
                return Err(McpError::InvalidRequest(format!(
                    "unsupported jsonrpc version {version:?}"
                )));
            }
        }

        let params = request.params.as_ref().unwrap_or(&Value::Null);

        match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.registry.list()),
            "tools/call" => self.call_tool(params),
            "resources/list" => Ok(ui::resources_list()),
            "resources/templates/list" => Ok(ui::resource_templates_list()),
            "resources/read" => {
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| McpError::InvalidParams("missing `uri`".to_string()))?;
                ui::read_resource(&self.assets, uri).await
            }
            method if method.starts_with("notifications/") => Ok(json!({})),
            method => Err(McpError::MethodNotFound(method.to_string())),
        }
    }

    fn call_tool(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("missing tool `name`".to_string()))?;
        let args = params.get("arguments").unwrap_or(&Value::Null);

        let (tool, reply) = self.registry.call(name, args)?;
        Ok(reply.into_result(tool.meta()))
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handles `initialize` request (Handshake).
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "listChanged": false, "subscribe": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartStore;

    fn session() -> McpSession {
        McpSession::new(
            ToolRegistry::bind(Arc::new(CartStore::new())),
            WidgetAssets::new("assets"),
        )
    }

    fn tool_call(id: i64, name: &str, arguments: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(
            id,
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
    }

    #[test]
    fn test_connect_is_allowed_once() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Created);

        session.connect().unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.connect(), Err(SessionError::AlreadyConnected));

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.connect(), Err(SessionError::Closed));
    }

    #[tokio::test]
    async fn test_requests_need_a_connected_session() {
        let mut session = session();

        let reply = session
            .handle(JsonRpcRequest::new(1, "ping", None))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32600);
        assert_eq!(reply["error"]["message"], "session is not connected");

        session.connect().unwrap();
        session.close();
        let reply = session
            .handle(JsonRpcRequest::new(2, "ping", None))
            .await
            .unwrap();
        assert_eq!(reply["error"]["message"], "session is closed");
    }

    #[tokio::test]
    async fn test_serving_returns_to_connected_after_each_call() {
        let mut session = session();
        session.connect().unwrap();

        let reply = session
            .handle(tool_call(1, "add_item", json!({ "name": "Pen", "price": 1.5 })))
            .await
            .unwrap();

        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["structuredContent"]["cart"][0]["name"], "Pen");
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply_but_still_run() {
        let mut session = session();
        session.connect().unwrap();

        let mut request = tool_call(0, "add_item", json!({ "name": "Pen", "price": 1.5 }));
        request.id = None;

        assert!(session.handle(request).await.is_none());
        assert_eq!(session.registry().store().snapshot().len(), 1);

        let mut initialized = JsonRpcRequest::new(0, "notifications/initialized", None);
        initialized.id = None;
        assert!(session.handle(initialized).await.is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors_use_json_rpc_codes() {
        let mut session = session();
        session.connect().unwrap();

        let reply = session
            .handle(JsonRpcRequest::new(1, "carts/explode", None))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32601);

        let reply = session
            .handle(tool_call(2, "unknown_tool", json!({})))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32602);
        assert_eq!(reply["error"]["message"], "Unknown tool: unknown_tool");

        let reply = session
            .handle(JsonRpcRequest::new(3, "tools/call", Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32602);

        let reply = session
            .handle(JsonRpcRequest::new(4, "resources/read", None))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32602);

        let mut bad_version = JsonRpcRequest::new(5, "ping", None);
        bad_version.jsonrpc = Some("1.0".into());
        let reply = session.handle(bad_version).await.unwrap();
        assert_eq!(reply["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_validation_failures_are_tool_results() {
        let mut session = session();
        session.connect().unwrap();

        let reply = session
            .handle(tool_call(1, "update_qty", json!({ "id": "item-1", "qty": 0 })))
            .await
            .unwrap();

        assert!(reply.get("error").is_none());
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Invalid arguments"));
        assert_eq!(reply["result"]["structuredContent"]["cart"], json!([]));
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let mut session = session();
        session.connect().unwrap();

        let reply = session
            .handle(JsonRpcRequest::new(1, "initialize", Some(json!({}))))
            .await
            .unwrap();

        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(reply["result"]["serverInfo"]["name"], "shopping-cart-mcp");
    }
}
