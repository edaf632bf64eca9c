use reqwest::Client;

use crate::{
    api::{AGENT_ID_HEADER, API_KEY_HEADER},
    config::Settings,
    error, info, success,
    types::ToolResponse,
    warning,
};

/// Asks a running service for a Spotify authorization link and opens it.
///
/// Calls the `oauth2-spotify` tool of the service at `server` on behalf of
/// `agent_id`. The pending authorization lives in that service, so the
/// browser has to complete the flow against the same instance. When the
/// browser cannot be opened the link is printed instead.
pub async fn authorize(settings: Settings, server: String, agent_id: String) {
    let url = format!("{}/tools/oauth2-spotify", server.trim_end_matches('/'));

    let mut request = Client::new()
        .post(&url)
        .header(AGENT_ID_HEADER, &agent_id)
        .json(&serde_json::json!({}));
    if let Some(key) = &settings.api_key {
        request = request.header(API_KEY_HEADER, key);
    }

    let response = match request.send().await {
        Ok(resp) => resp,
        Err(e) => error!("Cannot reach service at {}: {}", server, e),
    };
    let status = response.status();
    let body = match response.json::<ToolResponse>().await {
        Ok(body) => body,
        Err(e) => error!("Unexpected response from service ({}): {}", status, e),
    };
    if !status.is_success() {
        error!("Service refused authorization ({}): {}", status, body.data);
    }

    let Some(auth_url) = body.data["authorization_url"].as_str() else {
        error!("Service response carries no authorization url");
    };

    info!("Authorizing agent {}", agent_id);
    if webbrowser::open(auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
        return;
    }
    success!("Opened authorization page in the browser.");
}
