//! Shopping Cart MCP Server Library
//!
//! This library exposes a small shopping cart as Model Context Protocol
//! tools, together with the widget resource a host renders next to them.

// Domain modules
pub mod cart;
pub mod mcp;
pub mod ui;

// Infrastructure
pub mod config;
pub mod error;
pub mod router;
pub mod state;

pub use config::{CartScope, Config};
pub use error::{CartError, ConfigError, McpError, SessionError};
pub use state::{AppState, SharedState};
