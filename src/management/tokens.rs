use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::types::Token;

/// Association of caller identity to Spotify OAuth2 tokens.
///
/// The store is injected into the application state; the default
/// implementation keeps everything in memory for the lifetime of the process.
pub trait TokenStore: Send + Sync {
    /// Stores `token` for `agent_id`, replacing any previous one.
    fn insert(&self, agent_id: &str, token: Token);

    fn get(&self, agent_id: &str) -> Option<Token>;

    fn remove(&self, agent_id: &str) -> Option<Token>;

    /// Drops every token that is expired at `now` and cannot be refreshed.
    /// Returns how many were dropped.
    fn purge_expired(&self, now: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, Token>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written token behind,
    // so a poisoned map is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Token>> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Token>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for InMemoryTokenStore {
    fn insert(&self, agent_id: &str, token: Token) {
        self.write().insert(agent_id.to_string(), token);
    }

    fn get(&self, agent_id: &str) -> Option<Token> {
        self.read().get(agent_id).cloned()
    }

    fn remove(&self, agent_id: &str) -> Option<Token> {
        self.write().remove(agent_id)
    }

    fn purge_expired(&self, now: u64) -> usize {
        let mut tokens = self.write();
        let before = tokens.len();
        tokens.retain(|_, token| !token.refresh_token.is_empty() || !token.is_expired(now));
        before - tokens.len()
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}
