//! Shopping Cart Business Logic Helpers
//!
//! This module contains pure helper functions for totals and formatting.

use super::models::LineItem;

/// Sums `price * qty` over every line.
pub fn cart_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::subtotal).sum()
}

/// Formats an amount with two decimals, e.g. `7.50`.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Pen, 1x Notebook"`.
pub fn format_item_summary(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.qty, i.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: f64, qty: u32) -> LineItem {
        LineItem {
            id: format!("item-{name}"),
            name: name.into(),
            price,
            qty,
        }
    }

    #[test]
    fn test_total_multiplies_price_by_quantity() {
        let items = vec![item("Pen", 1.5, 5), item("Notebook", 4.0, 2)];
        assert_eq!(cart_total(&items), 15.5);
        assert_eq!(cart_total(&[]), 0.0);
    }

    #[test]
    fn test_amounts_use_two_decimals() {
        assert_eq!(format_amount(7.5), "7.50");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn test_summary_lists_quantities() {
        let items = vec![item("Pen", 1.5, 2), item("Ink", 3.0, 1)];
        assert_eq!(format_item_summary(&items), "2x Pen, 1x Ink");
    }
}
