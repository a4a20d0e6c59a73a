//! MCP session state.
//!
//! Holds the premium store handle shared by every tool call. No query
//! results are kept between calls.

use std::sync::Arc;

use crate::store::PremiumStore;

/// MCP session state.
#[derive(Clone)]
pub struct McpSession {
    store: Arc<dyn PremiumStore>,
}

impl McpSession {
    /// Create a new MCP session over a premium store.
    pub fn new(store: impl PremiumStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Get the underlying premium store.
    pub fn store(&self) -> &dyn PremiumStore {
        self.store.as_ref()
    }
}
