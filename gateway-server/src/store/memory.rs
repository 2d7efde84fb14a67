use super::{AuthStore, AuthorizationCode, PendingAuthorization};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-process store backed by mutex-guarded maps.
///
/// `HashMap::remove` under the lock gives the atomic lookup-and-delete the
/// consume operations require. The locks are only ever held for the map
/// operation itself; the upstream token exchange always runs after the
/// pending entry has already been removed.
pub struct InMemoryStore {
    pending: Mutex<HashMap<String, PendingAuthorization>>,
    codes: Mutex<HashMap<String, AuthorizationCode>>,
    /// Maximum age of a pending entry before the sweeper reaps it
    pending_ttl: Duration,
}

impl InMemoryStore {
    pub fn new(pending_ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            codes: Mutex::new(HashMap::new()),
            pending_ttl,
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingAuthorization>> {
        // A poisoned lock means a panic while holding it; the maps hold no
        // invariants beyond their entries, so the data is still usable.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_codes(&self) -> std::sync::MutexGuard<'_, HashMap<String, AuthorizationCode>> {
        self.codes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn put_pending(&self, state: &str, pending: PendingAuthorization) {
        self.lock_pending().insert(state.to_string(), pending);
    }

    async fn consume_pending(&self, state: &str) -> Option<PendingAuthorization> {
        self.lock_pending().remove(state)
    }

    async fn put_code(&self, code: &str, grant: AuthorizationCode) {
        self.lock_codes().insert(code.to_string(), grant);
    }

    async fn consume_code(&self, code: &str) -> Option<AuthorizationCode> {
        self.lock_codes().remove(code)
    }

    async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        {
            let mut codes = self.lock_codes();
            let before = codes.len();
            codes.retain(|_, grant| grant.expires_at > now);
            removed += before - codes.len();
        }

        {
            let mut pending = self.lock_pending();
            let before = pending.len();
            pending.retain(|_, entry| now.duration_since(entry.created_at) < self.pending_ttl);
            removed += before - pending.len();
        }

        removed
    }
}
