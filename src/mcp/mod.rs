//! Model Context Protocol (MCP) Module
//!
//! This module contains all MCP protocol implementation, including:
//! - Protocol models (JsonRpcRequest, constants)
//! - RPC helpers (success/error responses, widget metadata)
//! - Tool schemas, the tool registry and reply rendering
//! - Per-request protocol sessions
//! - HTTP handlers for the protocol endpoint

pub mod handlers;
pub mod helpers;
pub mod models;
pub mod response;
pub mod schema;
pub mod session;
pub mod tools;

// Re-export commonly used types and functions
pub use handlers::routes;
pub use session::{McpSession, SessionState};
pub use tools::{ToolRegistry, TOOLS};
