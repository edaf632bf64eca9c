use std::sync::Arc;

use crate::{config::Settings, error, server, state::AppState};

/// Starts the HTTP service and serves until the process is stopped.
///
/// `addr` overrides `SERVER_ADDRESS` for this run. Failing to bind the
/// listener is fatal.
pub async fn serve(settings: Settings, addr: Option<String>) {
    let mut settings = settings;
    if let Some(addr) = addr {
        settings.server_address = addr;
    }

    let state = Arc::new(AppState::new(settings));
    if let Err(e) = server::start_api_server(state).await {
        error!("Service stopped: {}", e);
    }
}
