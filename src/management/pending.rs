use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// Seconds an authorization link stays usable.
pub const PENDING_AUTHORIZATION_TTL_SECS: u64 = 600;

/// An authorization the caller has started but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub agent_id: String,
    pub code_verifier: String,
    pub created_at: u64,
}

impl PendingAuthorization {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.created_at + PENDING_AUTHORIZATION_TTL_SECS
    }
}

/// Pending authorizations keyed by the OAuth2 `state` value.
#[derive(Debug, Default)]
pub struct PendingAuthorizations {
    entries: Mutex<HashMap<String, PendingAuthorization>>,
}

impl PendingAuthorizations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingAuthorization>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `pending` under `state` and forgets entries that already expired.
    pub fn insert(&self, state: String, pending: PendingAuthorization, now: u64) {
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(state, pending);
    }

    /// Removes and returns the authorization for `state`. Each state can be
    /// taken once; expired entries are never returned.
    pub fn take(&self, state: &str, now: u64) -> Option<PendingAuthorization> {
        self.lock()
            .remove(state)
            .filter(|pending| !pending.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
