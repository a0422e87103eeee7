//! Application State Management
//!
//! [`AppState`] owns the process-wide cart, the widget assets and the table
//! of live protocol sessions. It is also the session factory: every inbound
//! request gets exactly one [`McpSession`] from [`AppState::open_session`],
//! discarded when the request finishes or the client goes away.

use crate::cart::CartStore;
use crate::config::{CartScope, Config};
use crate::mcp::session::McpSession;
use crate::mcp::tools::ToolRegistry;
use crate::ui::WidgetAssets;
use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::info;
use uuid::Uuid;

// =============================================================================
// Session table
// =============================================================================

/// Bookkeeping for one open session.
#[derive(Debug, Clone, Copy)]
pub struct SessionInfo {
    pub opened_at: Instant,
    pub scope: CartScope,
}

impl SessionInfo {
    /// Time since the session was registered.
    pub fn open_for(&self) -> Duration {
        self.opened_at.elapsed()
    }
}

/// Sessions currently attached to a transport.
///
/// DashMap allows concurrent access without external Mutexes.
#[derive(Debug, Default)]
pub struct SessionTable {
    live: DashMap<Uuid, SessionInfo>,
}

impl SessionTable {
    pub fn register(&self, id: Uuid, scope: CartScope) {
        self.live.insert(
            id,
            SessionInfo {
                opened_at: Instant::now(),
                scope,
            },
        );
    }

    /// Drops `id` from the table, returning its bookkeeping.
    pub fn release(&self, id: &Uuid) -> Option<SessionInfo> {
        self.live.remove(id).map(|(_, info)| info)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state
#[derive(Debug)]
pub struct AppState {
    scope: CartScope,
    /// Cart bound by every session under [`CartScope::Shared`].
    store: Arc<CartStore>,
    assets: WidgetAssets,
    sessions: Arc<SessionTable>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CartScope::default(), WidgetAssets::discover())
    }
}

impl AppState {
    pub fn new(scope: CartScope, assets: WidgetAssets) -> Self {
        info!(?scope, assets = %assets.dir().display(), "initialising application state");
        Self {
            scope,
            store: Arc::new(CartStore::new()),
            assets,
            sessions: Arc::new(SessionTable::default()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let assets = config
            .assets_dir
            .clone()
            .map(WidgetAssets::new)
            .unwrap_or_else(WidgetAssets::discover);
        Self::new(config.cart_scope, assets)
    }

    pub fn scope(&self) -> CartScope {
        self.scope
    }

    /// The process-wide cart. Unused by sessions under [`CartScope::Session`].
    pub fn shared_store(&self) -> &Arc<CartStore> {
        &self.store
    }

    /// Creates the protocol session for one inbound request.
    ///
    /// The session starts in the `Created` state with a fresh tool registry
    /// bound to the cart selected by the configured scope, and is listed as
    /// live until it is closed or dropped.
    pub fn open_session(&self) -> McpSession {
        let store = match self.scope {
            CartScope::Shared => Arc::clone(&self.store),
            CartScope::Session => Arc::new(CartStore::new()),
        };

        let session = McpSession::new(ToolRegistry::bind(store), self.assets.clone())
            .tracked_by(Arc::clone(&self.sessions));
        self.sessions.register(session.id(), self.scope);
        session
    }

    /// Number of sessions still attached to a transport.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }
}
