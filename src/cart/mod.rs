//! Shopping Cart Domain Module
//!
//! This module contains all shopping cart business logic, including:
//! - Domain models (LineItem, snapshots)
//! - Business logic helpers (totals, formatting)
//! - The cart store and its id generator

pub mod helpers;
pub mod models;
pub mod state;

// Re-export commonly used types for convenience
pub use models::{CartSnapshot, LineItem};
pub use state::{CartStore, IdGenerator};
