use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod memory;

/// One in-flight downstream authorization request, written on `/authorize`
/// and consumed once by the matching `/callback`.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// PKCE challenge committed by the downstream client
    pub code_challenge: String,
    /// PKCE challenge method ("S256" or "plain")
    pub code_challenge_method: String,
    /// Downstream redirect URI, re-checked at token exchange
    pub redirect_uri: String,
    /// Downstream client id, re-checked at token exchange
    pub client_id: String,
    /// When the entry was written; the sweeper reaps abandoned logins
    pub created_at: Instant,
}

/// One verified login awaiting code exchange, written on a successful
/// `/callback` and consumed once by `/token`.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// Verified upstream identity, the subject of the issued tokens
    pub email: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub redirect_uri: String,
    pub client_id: String,
    /// Absolute deadline; the entry is rejected (and deleted) past it
    pub expires_at: Instant,
}

impl AuthorizationCode {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Store for the two kinds of single-use authorization state.
///
/// Every consume operation is atomic: the lookup and the delete happen as
/// one step, so two concurrent consumers of the same key observe exactly
/// one hit. Implementations must not perform I/O while holding any
/// internal lock.
#[async_trait::async_trait]
pub trait AuthStore: Send + Sync {
    /// Store a pending authorization under the gateway's internal state key
    async fn put_pending(&self, state: &str, pending: PendingAuthorization);

    /// Remove and return the pending authorization for a state key
    async fn consume_pending(&self, state: &str) -> Option<PendingAuthorization>;

    /// Store an authorization code entry under the code
    async fn put_code(&self, code: &str, grant: AuthorizationCode);

    /// Remove and return the entry for an authorization code. Expiry is the
    /// caller's concern: an expired entry is still returned (exactly once)
    /// so the caller can distinguish "expired" from "unknown".
    async fn consume_code(&self, code: &str) -> Option<AuthorizationCode>;

    /// Delete expired codes and aged-out pending entries, returning how
    /// many entries were removed
    async fn sweep(&self) -> usize;
}

/// Spawn the background task that periodically sweeps expired entries
pub fn spawn_sweeper(store: Arc<dyn AuthStore>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick fires immediately; skip it so an empty store is
        // not swept at startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.sweep().await;
            if removed > 0 {
                debug!("Swept {} expired authorization entries", removed);
            }
        }
    });
}
