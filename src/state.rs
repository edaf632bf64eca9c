use std::sync::Arc;

use crate::{
    config::Settings,
    dispatch::Dispatcher,
    management::{InMemoryTokenStore, TokenStore},
};

/// Everything the HTTP handlers share.
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Dispatcher,
    pub tokens: Arc<dyn TokenStore>,
}

impl AppState {
    /// Builds the state with an in-memory token store.
    pub fn new(settings: Settings) -> Self {
        Self::with_token_store(settings, Arc::new(InMemoryTokenStore::new()))
    }

    pub fn with_token_store(settings: Settings, tokens: Arc<dyn TokenStore>) -> Self {
        let dispatcher = Dispatcher::from_settings(&settings, Arc::clone(&tokens));
        Self {
            settings,
            dispatcher,
            tokens,
        }
    }
}
