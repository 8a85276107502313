//! One-time exchange code store for the CLI token handoff.
//!
//! When a provider login completes with a CLI context attached, the access
//! token is parked here under a fresh random code. The CLI then redeems the
//! code through the exchange endpoint; redemption is destructive, so the
//! token can be handed out at most once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use envlink_common::token::{TOKEN_BYTES, secure_hex_token};

/// How long a minted exchange code stays redeemable.
pub const EXCHANGE_TTL: Duration = Duration::from_secs(2 * 60);

/// A token parked for one CLI exchange.
#[derive(Debug, Clone)]
struct PendingExchange {
    token: String,
    state: String,
    expires_at: Instant,
}

/// Mutex-guarded map from exchange code to pending entry.
///
/// Owned by the application state and shared across all concurrent login
/// flows; the critical sections are single map operations, so one lock is
/// enough at expected login volumes.
#[derive(Debug, Default)]
pub struct PendingExchangeStore {
    entries: Mutex<HashMap<String, PendingExchange>>,
}

impl PendingExchangeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Park `token` under `exchange_code`, redeemable for `ttl`.
    ///
    /// A call with any empty field is a no-op. An entry saved with a zero
    /// TTL is expired at birth and can never be redeemed.
    pub async fn save(&self, exchange_code: &str, state: &str, token: &str, ttl: Duration) {
        if exchange_code.is_empty() || state.is_empty() || token.is_empty() {
            return;
        }

        let mut entries = self.entries.lock().await;
        entries.insert(
            exchange_code.to_string(),
            PendingExchange {
                token: token.to_string(),
                state: state.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Redeem `exchange_code`, returning the parked token.
    ///
    /// The entry is removed on lookup before any validation, so a wrong
    /// state or an expired entry destroys the code permanently; a second,
    /// correct attempt also comes back empty. Fail closed, redeem once.
    pub async fn consume(&self, exchange_code: &str, state: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(exchange_code)?;

        if Instant::now() >= entry.expires_at {
            return None;
        }

        if entry.state != state {
            return None;
        }

        Some(entry.token)
    }

    /// Drop expired-but-unconsumed entries, returning how many were removed.
    ///
    /// Abandoned logins never call the exchange endpoint, so without a sweep
    /// the map grows until restart. Driven by the state's background cleanup
    /// task.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let initial = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        initial - entries.len()
    }

    /// Number of pending entries.
    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Mint a new random exchange code: 24 secure random bytes, hex-encoded.
pub fn new_exchange_code() -> String {
    secure_hex_token(TOKEN_BYTES)
}
