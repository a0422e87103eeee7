//! Tool registry and handlers.
//!
//! [`TOOLS`] is the fixed table of cart tools. A [`ToolRegistry`] binds that
//! table to one [`CartStore`]; each protocol session gets its own binding.
//! Arguments are validated against the tool's [`FieldSpec`] table before the
//! handler runs, and a validation failure is answered with corrective text
//! rather than a protocol error.

use super::helpers::widget_meta;
use super::models::WIDGET_TEMPLATE_URI;
use super::response::ToolReply;
use super::schema::{self, Args, Constraint, Fallback, FieldKind, FieldSpec};
use crate::cart::helpers::format_amount;
use crate::cart::CartStore;
use crate::error::{CartError, McpError, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Signature of a tool handler. Arguments are already validated.
pub type ToolHandler = fn(&CartStore, &Args) -> ToolReply;

/// A registered tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolDef {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    /// Resource the host renders alongside the tool result.
    pub ui: &'static str,
    pub invoking: &'static str,
    pub invoked: &'static str,
    pub handler: ToolHandler,
}

impl ToolDef {
    /// Widget metadata for this tool.
    pub fn meta(&self) -> Value {
        let mut meta = widget_meta(self.invoking, self.invoked);
        meta["openai/outputTemplate"] = json!(self.ui);
        meta
    }

    /// Descriptor returned by `tools/list`.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "title": self.title,
            "description": self.description,
            "inputSchema": schema::json_schema(self.fields),
            "_meta": self.meta(),
        })
    }
}

// =============================================================================
// Field tables
// =============================================================================

const QTY_MAX: i64 = u32::MAX as i64;

const ID_FIELD: FieldSpec = FieldSpec {
    name: "id",
    kind: FieldKind::Text,
    constraint: Constraint::NonEmpty,
    required: true,
    fallback: None,
    description: "Line item id, e.g. item-1",
};

const ADD_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        kind: FieldKind::Text,
        constraint: Constraint::NonEmpty,
        required: true,
        fallback: None,
        description: "Product name",
    },
    FieldSpec {
        name: "price",
        kind: FieldKind::Number,
        constraint: Constraint::NonNegative,
        required: true,
        fallback: None,
        description: "Unit price",
    },
    FieldSpec {
        name: "qty",
        kind: FieldKind::Integer,
        constraint: Constraint::Range { min: 1, max: QTY_MAX },
        required: false,
        fallback: Some(Fallback::Integer(1)),
        description: "Quantity to add",
    },
];

const UPDATE_QTY_FIELDS: &[FieldSpec] = &[
    ID_FIELD,
    FieldSpec {
        name: "qty",
        kind: FieldKind::Integer,
        constraint: Constraint::Range { min: 1, max: QTY_MAX },
        required: true,
        fallback: None,
        description: "New quantity",
    },
];

const REMOVE_ITEM_FIELDS: &[FieldSpec] = &[ID_FIELD];

/// Every tool this server exposes, in `tools/list` order.
pub static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "get_cart",
        title: "Show cart",
        description: "Returns the current contents of the shopping cart.",
        fields: &[],
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Loading cart",
        invoked: "Cart loaded",
        handler: get_cart,
    },
    ToolDef {
        name: "add_item",
        title: "Add item",
        description: "Adds an item to the cart. Adding the same name at the same price increases its quantity.",
        fields: ADD_ITEM_FIELDS,
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Adding item",
        invoked: "Item added",
        handler: add_item,
    },
    ToolDef {
        name: "update_qty",
        title: "Update quantity",
        description: "Sets the quantity of a cart line by id.",
        fields: UPDATE_QTY_FIELDS,
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Updating quantity",
        invoked: "Quantity updated",
        handler: update_qty,
    },
    ToolDef {
        name: "remove_item",
        title: "Remove item",
        description: "Removes a cart line by id.",
        fields: REMOVE_ITEM_FIELDS,
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Removing item",
        invoked: "Item removed",
        handler: remove_item,
    },
    ToolDef {
        name: "clear_cart",
        title: "Clear cart",
        description: "Removes every item from the cart.",
        fields: &[],
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Clearing cart",
        invoked: "Cart cleared",
        handler: clear_cart,
    },
    ToolDef {
        name: "checkout_demo",
        title: "Checkout (demo)",
        description: "Computes the order total and empties the cart. No payment is taken.",
        fields: &[],
        ui: WIDGET_TEMPLATE_URI,
        invoking: "Checking out",
        invoked: "Checked out",
        handler: checkout_demo,
    },
];

/// Looks up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolDef> {
    TOOLS.iter().find(|t| t.name == name)
}

// =============================================================================
// Registry
// =============================================================================

/// The tool table bound to one cart store.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    store: Arc<CartStore>,
}

impl ToolRegistry {
    pub fn bind(store: Arc<CartStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    pub fn store_handle(&self) -> &Arc<CartStore> {
        &self.store
    }

    /// `tools/list` payload.
    pub fn list(&self) -> Value {
        json!({
            "tools": TOOLS.iter().map(ToolDef::descriptor).collect::<Vec<_>>(),
        })
    }

    /// Validates `args` for tool `name` and runs it.
    pub fn call(&self, name: &str, args: &Value) -> Result<(&'static ToolDef, ToolReply)> {
        let tool = find_tool(name).ok_or_else(|| McpError::UnknownTool(name.to_string()))?;

        let reply = match schema::validate(tool.fields, args) {
            Ok(valid) => (tool.handler)(&self.store, &valid),
            Err(problems) => {
                debug!(tool = tool.name, ?problems, "rejected tool arguments");
                ToolReply::new(
                    format!("Invalid arguments: {}.", problems.join("; ")),
                    self.store.snapshot(),
                )
            }
        };

        info!(tool = tool.name, items = reply.cart.len(), "tool call handled");
        Ok((tool, reply))
    }
}

// =============================================================================
// Handlers
// =============================================================================

// Validation guarantees every required field and every field with a fallback
// is present with the right kind, so the accessors below fall back only to
// keep the handlers total.

fn qty_arg(args: &Args) -> u32 {
    args.integer("qty")
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

fn get_cart(store: &CartStore, _args: &Args) -> ToolReply {
    ToolReply::silent(store.snapshot())
}

fn add_item(store: &CartStore, args: &Args) -> ToolReply {
    let name = args.text("name").unwrap_or_default();
    let price = args.number("price").unwrap_or_default();
    let qty = qty_arg(args);

    match store.add_item(name, price, qty) {
        Ok((added, cart)) if added.merged => ToolReply::new(
            format!(
                "Added {}x {}; now {}x in cart.",
                qty, added.item.name, added.item.qty
            ),
            cart,
        ),
        Ok((added, cart)) => ToolReply::new(
            format!(
                "Added {}x {} at {} ({}).",
                qty,
                added.item.name,
                format_amount(added.item.price),
                added.item.id
            ),
            cart,
        ),
        Err(CartError::EmptyName) => ToolReply::new("Item name is required.", store.snapshot()),
        Err(err) => ToolReply::new(format!("Nothing added: {err}."), store.snapshot()),
    }
}

fn update_qty(store: &CartStore, args: &Args) -> ToolReply {
    let id = args.text("id").unwrap_or_default();
    let qty = qty_arg(args);

    match store.update_qty(id, qty) {
        Ok((item, cart)) => ToolReply::new(format!("Set {} to {}x.", item.name, item.qty), cart),
        Err(err) => ToolReply::new(format!("Not found: {err}."), store.snapshot()),
    }
}

fn remove_item(store: &CartStore, args: &Args) -> ToolReply {
    let id = args.text("id").unwrap_or_default();

    match store.remove_item(id) {
        Ok((item, cart)) => ToolReply::new(format!("Removed {} ({}).", item.name, item.id), cart),
        Err(err) => ToolReply::new(format!("Nothing to remove: {err}."), store.snapshot()),
    }
}

fn clear_cart(store: &CartStore, _args: &Args) -> ToolReply {
    ToolReply::new("Cart cleared.", store.clear())
}

fn checkout_demo(store: &CartStore, _args: &Args) -> ToolReply {
    let (total, cart) = store.checkout();
    info!(total, "demo checkout");
    ToolReply::new(
        format!("Checked out. Total: {}.", format_amount(total)),
        cart,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::bind(Arc::new(CartStore::new()))
    }

    fn call(registry: &ToolRegistry, name: &str, args: Value) -> ToolReply {
        registry.call(name, &args).expect("tool call failed").1
    }

    #[test]
    fn test_pen_scenario_merges_then_checks_out() {
        let registry = registry();

        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5, "qty": 2 }));
        let reply = call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5, "qty": 3 }));
        assert_eq!(reply.cart.len(), 1);
        assert_eq!(reply.cart[0].name, "Pen");
        assert_eq!(reply.cart[0].price, 1.5);
        assert_eq!(reply.cart[0].qty, 5);

        let reply = call(&registry, "checkout_demo", json!({}));
        assert!(reply.message.contains("7.50"), "{}", reply.message);
        assert!(reply.cart.is_empty());
    }

    #[test]
    fn test_add_item_defaults_qty_to_one() {
        let reply = call(&registry(), "add_item", json!({ "name": "Ink", "price": "3" }));
        assert_eq!(reply.cart[0].qty, 1);
        assert_eq!(reply.cart[0].price, 3.0);
    }

    #[test]
    fn test_blank_name_is_answered_with_text() {
        let registry = registry();
        let reply = call(&registry, "add_item", json!({ "name": "   ", "price": 1 }));
        assert!(reply.message.starts_with("Invalid arguments"));
        assert!(reply.message.contains("`name` must not be empty"));
        assert!(reply.cart.is_empty());
    }

    #[test]
    fn test_zero_qty_update_is_rejected_before_the_store() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5, "qty": 2 }));
        let before = registry.store().snapshot();

        let reply = call(&registry, "update_qty", json!({ "id": "item-1", "qty": 0 }));

        assert!(reply.message.contains("`qty` must be an integer >= 1"));
        assert_eq!(reply.cart, before);
        assert_eq!(registry.store().snapshot(), before);
    }

    #[test]
    fn test_overflowing_merge_is_answered_with_text_and_no_change() {
        let registry = registry();
        let max = u64::from(u32::MAX);
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.0, "qty": max }));
        let before = registry.store().snapshot();

        let reply = call(&registry, "add_item", json!({ "name": "Pen", "price": 1.0, "qty": 5 }));

        assert_eq!(
            reply.message,
            "Nothing added: item-1 already holds 4294967295 units; adding more would exceed the quantity limit."
        );
        assert_eq!(reply.cart, before);
        assert_eq!(reply.cart[0].qty, u32::MAX);
    }

    #[test]
    fn test_update_qty_on_unknown_id_reports_not_found() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5 }));
        let before = registry.store().snapshot();

        let reply = call(&registry, "update_qty", json!({ "id": "item-42", "qty": 3 }));

        assert_eq!(reply.message, "Not found: no item with id item-42.");
        assert_eq!(reply.cart, before);
    }

    #[test]
    fn test_update_qty_sets_quantity() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5 }));

        let reply = call(&registry, "update_qty", json!({ "id": "item-1", "qty": 9 }));

        assert_eq!(reply.message, "Set Pen to 9x.");
        assert_eq!(reply.cart[0].qty, 9);
    }

    #[test]
    fn test_second_remove_reports_nothing_to_remove() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5 }));

        let first = call(&registry, "remove_item", json!({ "id": "item-1" }));
        let second = call(&registry, "remove_item", json!({ "id": "item-1" }));

        assert_eq!(first.message, "Removed Pen (item-1).");
        assert!(second.message.starts_with("Nothing to remove"));
        assert!(second.cart.is_empty());
    }

    #[test]
    fn test_get_cart_matches_last_mutation() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5 }));
        let last = call(&registry, "add_item", json!({ "name": "Ink", "price": 3.0, "qty": 2 }));

        let reply = call(&registry, "get_cart", Value::Null);

        assert!(reply.message.is_empty());
        assert_eq!(reply.cart, last.cart);
    }

    #[test]
    fn test_clear_cart_empties() {
        let registry = registry();
        call(&registry, "add_item", json!({ "name": "Pen", "price": 1.5 }));
        let reply = call(&registry, "clear_cart", json!({}));
        assert_eq!(reply.message, "Cart cleared.");
        assert!(reply.cart.is_empty());
    }

    #[test]
    fn test_unknown_tool_is_a_protocol_error() {
        let err = registry().call("nope", &json!({})).unwrap_err();
        assert!(matches!(err, McpError::UnknownTool(ref name) if name == "nope"));
    }

    #[test]
    fn test_list_describes_every_tool() {
        let listed = registry().list();
        let names: Vec<_> = listed["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            ["get_cart", "add_item", "update_qty", "remove_item", "clear_cart", "checkout_demo"]
        );
        assert_eq!(
            listed["tools"][1]["inputSchema"]["required"],
            json!(["name", "price"])
        );
    }
}
