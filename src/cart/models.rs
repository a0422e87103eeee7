//! Shopping Cart Domain Models
//!
//! This module contains the data structures of the cart domain.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Cart Domain Models
// =============================================================================

/// One entry in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Identifier unique within the owning cart (`item-<n>`)
    pub id: String,

    /// Product name, never empty after trimming
    pub name: String,

    /// Unit price, non-negative
    pub price: f64,

    /// Quantity, at least 1
    pub qty: u32,
}

impl LineItem {
    /// Price of the whole line (`price * qty`).
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

/// Immutable view of the cart at one point in time.
///
/// Mutators swap in a fresh sequence, so a snapshot never changes after it
/// has been handed out.
pub type CartSnapshot = Arc<Vec<LineItem>>;

/// Result of an `add_item` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    /// The line as it stands after the add
    pub item: LineItem,

    /// Whether the quantity was merged into an existing line
    pub merged: bool,
}
