//! Tool replies.
//!
//! A [`ToolReply`] pairs a short status line with the cart snapshot taken
//! right after the tool's mutation. Both channels are rendered from the same
//! value, so the text and the structured content always describe the same
//! final cart.

use crate::cart::CartSnapshot;
use serde_json::{json, Value};

/// Dual-channel result of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    /// Human-readable status; empty means "no message".
    pub message: String,

    /// Post-mutation cart.
    pub cart: CartSnapshot,
}

impl ToolReply {
    pub fn new(message: impl Into<String>, cart: CartSnapshot) -> Self {
        Self {
            message: message.into(),
            cart,
        }
    }

    /// A reply that only carries the cart.
    pub fn silent(cart: CartSnapshot) -> Self {
        Self::new(String::new(), cart)
    }

    /// Renders the `tools/call` result, attaching `meta` as `_meta`.
    pub fn into_result(self, meta: Value) -> Value {
        let content = if self.message.is_empty() {
            json!([])
        } else {
            json!([{ "type": "text", "text": self.message }])
        };

        json!({
            "content": content,
            "structuredContent": { "cart": self.cart.as_slice() },
            "_meta": meta,
        })
    }
}
