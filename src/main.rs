use shopping_cart_mcp::router::create_app_router;
use shopping_cart_mcp::{AppState, Config};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` selects the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopping_cart_mcp=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;

    // Initialize application state
    let state = Arc::new(AppState::from_config(&config));

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(scope = ?config.cart_scope, "Shopping cart MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shopping_cart_mcp::cart::CartStore;
    use shopping_cart_mcp::mcp::ToolRegistry;
    use std::sync::Arc;

    #[test]
    fn test_store_and_aggregation() {
        let store = Arc::new(CartStore::new());

        // 1. Seed the cart directly through the store
        store.add_item("Apple", 0.5, 2).unwrap();

        // 2. Tool call through a registry bound to the same store
        let registry = ToolRegistry::bind(Arc::clone(&store));
        registry
            .call("add_item", &json!({ "name": "Apple", "price": 0.5, "qty": 3 }))
            .expect("Tool call failed");
        registry
            .call("add_item", &json!({ "name": "Banana", "price": 0.25 }))
            .expect("Tool call failed");

        // 3. Verify
        let items = store.snapshot();

        let apple = items.iter().find(|i| i.name == "Apple").unwrap();
        assert_eq!(apple.qty, 5, "Apple quantity should aggregate to 2+3=5");

        let banana = items.iter().find(|i| i.name == "Banana").unwrap();
        assert_eq!(banana.qty, 1, "Banana should be added with the default qty");
    }
}
