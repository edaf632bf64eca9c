use axum::{
    Extension, Router,
    routing::{get, post},
};
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, task::JoinHandle, time::interval};

use crate::{Res, api, info, management::TokenStore, state::AppState, success, utils};

/// How often stored tokens that can no longer be used are dropped.
pub const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(300);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/tools", get(api::list_tools))
        .route("/tools/{id}", post(api::invoke_tool))
        .route("/oauth2/callback/spotify", get(api::callback))
        .route("/oauth2/spotify/status", get(api::oauth_status))
        .layer(Extension(state))
}

/// Binds the configured address and serves until the process ends.
pub async fn start_api_server(state: Arc<AppState>) -> Res<()> {
    let addr = SocketAddr::from_str(&state.settings.server_address)
        .map_err(|e| format!("Failed to parse server address: {e}"))?;

    let listener = TcpListener::bind(&addr).await?;
    success!("Service is running at {}", listener.local_addr()?);
    serve(listener, state).await
}

/// Serves the router on `listener`. Expired tokens are swept in the
/// background for as long as the server runs.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Res<()> {
    let purge = spawn_token_purge(Arc::clone(&state.tokens), TOKEN_PURGE_INTERVAL);
    let served = axum::serve(listener, router(state)).await;
    purge.abort();
    served?;
    Ok(())
}

/// Periodically drops expired tokens without a refresh token from `tokens`.
/// The first sweep runs immediately.
pub fn spawn_token_purge(tokens: Arc<dyn TokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            let purged = tokens.purge_expired(utils::now_timestamp());
            if purged > 0 {
                info!("Purged {} expired tokens", purged);
            }
        }
    })
}
