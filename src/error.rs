//! Error types for the shopping cart MCP server.
//!
//! # Error Categories
//!
//! - **Domain errors** ([`CartError`]): the cart rejected a mutation. These are
//!   reported to the caller as tool text, never as protocol faults.
//! - **Protocol errors** ([`McpError`]): malformed envelopes, unknown methods or
//!   tools, missing resources. These become JSON-RPC error responses.
//! - **Session errors** ([`SessionError`]): lifecycle violations of a protocol
//!   session (connecting twice, calling after teardown).
//! - **Configuration errors** ([`ConfigError`]): bad environment values at
//!   startup.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors raised by [`CartStore`](crate::cart::CartStore) mutators.
///
/// The cart is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The item name was empty after trimming whitespace.
    #[error("item name must not be empty")]
    EmptyName,

    /// No line item carries the requested id.
    #[error("no item with id {0}")]
    NotFound(String),

    /// Merging would push a line's quantity past `u32::MAX`.
    #[error("{id} already holds {held} units; adding more would exceed the quantity limit")]
    QuantityOverflow { id: String, held: u32 },
}

/// Lifecycle violations of a [`McpSession`](crate::mcp::session::McpSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `connect` was called on a session that is already attached.
    #[error("session is already connected")]
    AlreadyConnected,

    /// A request arrived before the session was attached to a transport.
    #[error("session is not connected")]
    NotConnected,

    /// The session has been torn down and accepts no further calls.
    #[error("session is closed")]
    Closed,
}

/// Protocol-level failures, each mapping onto a JSON-RPC error code.
#[must_use = "errors should be handled or turned into a response"]
#[derive(Debug, Error)]
pub enum McpError {
    /// The request body was not valid JSON-RPC.
    #[error("Parse error")]
    Parse,

    /// The envelope parsed but is not a valid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The JSON-RPC method is not implemented.
    #[error("Method not found")]
    MethodNotFound(String),

    /// `tools/call` named a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Method parameters were missing or had the wrong shape.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// `resources/read` asked for a URI this server does not serve.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The widget markup could not be loaded from disk.
    #[error("Widget unavailable: {0}")]
    WidgetUnavailable(#[from] std::io::Error),

    /// The session refused the request.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl McpError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse => -32700,
            Self::InvalidRequest(_) | Self::Session(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::UnknownTool(_) | Self::InvalidParams(_) => -32602,
            Self::WidgetUnavailable(_) => -32603,
            Self::ResourceNotFound(_) => -32002,
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is not a valid TCP port number.
    #[error("invalid PORT value {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// `CART_SCOPE` is not one of `shared`, `process` or `session`.
    #[error("invalid CART_SCOPE value {0:?} (expected \"shared\", \"process\" or \"session\")")]
    InvalidScope(String),
}
