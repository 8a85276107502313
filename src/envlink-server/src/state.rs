//! Application state management.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::auth::exchange::PendingExchangeStore;
use crate::auth::provider::{GoogleProvider, ProviderRegistry};
use crate::config::ServerConfig;
use crate::error::AppResult;

/// How often expired pending exchanges are swept out.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across request handlers.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Registered identity providers.
    pub providers: ProviderRegistry,
    /// One-time exchange codes awaiting redemption by a CLI.
    pub pending_exchanges: PendingExchangeStore,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("listen_addr", &self.config.listen_addr)
            .field("providers", &self.providers)
            .finish()
    }
}

impl AppState {
    /// Create new application state from configuration.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(GoogleProvider::from_config(&config)?));

        Ok(Self {
            config,
            providers,
            pending_exchanges: PendingExchangeStore::new(),
        })
    }

    /// Start the background sweep of expired pending exchanges.
    ///
    /// Abandoned logins leave entries behind that nothing will ever
    /// consume; without this the store grows until restart. Call after
    /// wrapping the state in an `Arc`.
    pub fn start_cleanup_task(self: &Arc<Self>) {
        let state = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let removed = state.pending_exchanges.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "purged expired pending exchanges");
                }
            }
        });
    }
}
