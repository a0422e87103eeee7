//! Shopping Cart State Management
//!
//! [`CartStore`] owns one cart and its item-id generator. Every mutator
//! builds a brand-new sequence from the current one and swaps it in while
//! holding the lock, then returns the post-mutation snapshot taken in the
//! same critical section. Concurrent sessions sharing a store therefore see
//! one serialized history of mutations, and readers holding an older
//! [`CartSnapshot`] keep seeing it unchanged.

use super::helpers::cart_total;
use super::models::{Added, CartSnapshot, LineItem};
use crate::error::CartError;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

/// Prefix of generated line-item ids.
const ITEM_ID_PREFIX: &str = "item-";

/// Monotonic counter handing out `item-<n>` ids, starting at `item-1`.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator {
    /// Returns the next id.
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{ITEM_ID_PREFIX}{n}")
    }
}

/// A cart plus the generator for its item ids.
#[derive(Debug, Default)]
pub struct CartStore {
    items: Mutex<CartSnapshot>,
    ids: IdGenerator,
}

impl CartStore {
    /// Creates a store holding an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        Arc::clone(&self.lock())
    }

    /// Adds `qty` units of `name` at `price`.
    ///
    /// A line with the same name and the same price absorbs the quantity;
    /// the same name at a different price becomes its own line.
    pub fn add_item(
        &self,
        name: &str,
        price: f64,
        qty: u32,
    ) -> Result<(Added, CartSnapshot), CartError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CartError::EmptyName);
        }

        self.replace(|current| {
            let mut next = current.to_vec();
            if let Some(existing) = next
                .iter_mut()
                .find(|i| i.name == name && i.price == price)
            {
                let Some(total) = existing.qty.checked_add(qty) else {
                    return Err(CartError::QuantityOverflow {
                        id: existing.id.clone(),
                        held: existing.qty,
                    });
                };
                existing.qty = total;
                let item = existing.clone();
                return Ok((next, Added { item, merged: true }));
            }

            let item = LineItem {
                id: self.ids.next_id(),
                name: name.to_string(),
                price,
                qty,
            };
            next.push(item.clone());
            Ok((next, Added { item, merged: false }))
        })
    }

    /// Sets the quantity of the line identified by `id`.
    pub fn update_qty(&self, id: &str, qty: u32) -> Result<(LineItem, CartSnapshot), CartError> {
        self.replace(|current| {
            let mut next = current.to_vec();
            let line = next
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| CartError::NotFound(id.to_string()))?;
            line.qty = qty;
            let updated = line.clone();
            Ok((next, updated))
        })
    }

    /// Removes the line identified by `id`, keeping the others in order.
    pub fn remove_item(&self, id: &str) -> Result<(LineItem, CartSnapshot), CartError> {
        self.replace(|current| {
            let pos = current
                .iter()
                .position(|i| i.id == id)
                .ok_or_else(|| CartError::NotFound(id.to_string()))?;
            let mut next = current.to_vec();
            let removed = next.remove(pos);
            Ok((next, removed))
        })
    }

    /// Empties the cart.
    pub fn clear(&self) -> CartSnapshot {
        let mut items = self.lock();
        *items = Arc::new(Vec::new());
        Arc::clone(&items)
    }

    /// Totals the cart and empties it in one step.
    ///
    /// The total is computed from the contents right before clearing.
    pub fn checkout(&self) -> (f64, CartSnapshot) {
        let mut items = self.lock();
        let total = cart_total(&items);
        *items = Arc::new(Vec::new());
        (total, Arc::clone(&items))
    }

    /// Runs `f` against the current cart and, on success, installs the
    /// sequence it returns. Nothing is written when `f` fails.
    fn replace<T>(
        &self,
        f: impl FnOnce(&[LineItem]) -> Result<(Vec<LineItem>, T), CartError>,
    ) -> Result<(T, CartSnapshot), CartError> {
        let mut items = self.lock();
        let (next, value) = f(&items)?;
        *items = Arc::new(next);
        Ok((value, Arc::clone(&items)))
    }

    // The stored value is only ever replaced whole, so a panic in another
    // holder cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, CartSnapshot> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
