// Shared fixtures for the integration tests. Fake helpers are small `sh`
// scripts written under the names the registry expects; the bridge runs them
// with `sh` as the interpreter.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Extension, Form, Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use serde_json::{Value, json};
use spotools::{
    config::Settings, dispatch::Dispatcher, management::InMemoryTokenStore, types::AgentInfo,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const INFO_SCRIPT_OK: &str = r#"
printf '{"name": "%s", "followers": 1234567, "genres": ["j-pop", "anime"], "popularity": 77, "image": "https://i.scdn.co/image/ado", "id": "6mEQK9m2krja6X1cfsAjfl"}' "$1" > "$SPOTOOLS_ARTIFACT_PATH"
echo "Artist information saved"
"#;

pub const TOP_TRACKS_SCRIPT_OK: &str = r#"
printf '1. Usseewa\n\tAlbum: Kyougen\n\n2. Show\n\tAlbum: Zanmu\n\n'
printf '["https://i.scdn.co/image/a", "https://i.scdn.co/image/b"]' > "$SPOTOOLS_ARTIFACT_PATH"
"#;

pub const GENRES_SCRIPT_OK: &str = "printf '  Genres for %s: J-pop, Anime \\n\\n' \"$1\"\n";

pub const FOLLOWERS_SCRIPT_OK: &str =
    "printf \"Spotify Artist '%s' has 1,234,567 followers.\\n\" \"$1\"\n";

/// Writes `scripts` (file name, body) into a fresh directory.
pub fn helper_dir(scripts: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create helper dir");
    for (name, body) in scripts {
        fs::write(dir.path().join(name), body).expect("write helper script");
    }
    dir
}

/// A directory with a well-behaved helper for every artist tool.
pub fn working_helpers() -> TempDir {
    helper_dir(&[
        ("get_info.py", INFO_SCRIPT_OK),
        ("get_top_tracks.py", TOP_TRACKS_SCRIPT_OK),
        ("get_genres.py", GENRES_SCRIPT_OK),
        ("get_followers.py", FOLLOWERS_SCRIPT_OK),
    ])
}

pub fn settings_for(dir: &Path) -> Settings {
    Settings {
        helper_dir: dir.to_path_buf(),
        helper_interpreter: "sh".to_string(),
        helper_timeout: Duration::from_secs(10),
        ..Settings::default()
    }
}

/// Settings with the Spotify OAuth2 flow enabled. No request ever reaches
/// the token URL in tests.
pub fn oauth_settings_for(dir: &Path) -> Settings {
    Settings {
        base_url: Some("https://tools.example.test".to_string()),
        spotify_client_id: Some("client-123".to_string()),
        spotify_client_secret: Some("secret-456".to_string()),
        spotify_token_url: "http://127.0.0.1:9/api/token".to_string(),
        ..settings_for(dir)
    }
}

pub fn dispatcher_for(settings: &Settings) -> Dispatcher {
    Dispatcher::from_settings(settings, Arc::new(InMemoryTokenStore::new()))
}

pub fn agent(id: &str) -> AgentInfo {
    AgentInfo { id: id.to_string() }
}

/// One request received by [`TokenEndpoint`].
#[derive(Debug, Clone)]
pub struct TokenCall {
    pub form: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct TokenEndpointState {
    calls: Mutex<Vec<TokenCall>>,
    used_refresh_tokens: Mutex<HashSet<String>>,
}

/// In-process stand-in for Spotify's `/api/token`.
///
/// - code `good-code` is exchanged for `BQC-exchanged` / `AQD-first`
/// - refresh token `AQD-valid` yields `BQC-refreshed` without a new refresh token
/// - refresh token `AQD-rotating` yields `BQC-rotated` / `AQD-next` after 300 ms
///   on first use and is rejected afterwards, like a rotated Spotify token
/// - refresh token `AQD-broken` gets a 500
/// - anything else is rejected with 400 `invalid_grant`
pub struct TokenEndpoint {
    pub url: String,
    state: Arc<TokenEndpointState>,
}

impl TokenEndpoint {
    pub async fn spawn() -> Self {
        let state = Arc::new(TokenEndpointState::default());
        let app = Router::new()
            .route("/api/token", post(token))
            .layer(Extension(Arc::clone(&state)));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind token endpoint");
        let addr = listener.local_addr().expect("token endpoint address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}/api/token"),
            state,
        }
    }

    pub fn calls(&self) -> Vec<TokenCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

async fn token(
    Extension(state): Extension<Arc<TokenEndpointState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.calls.lock().unwrap().push(TokenCall {
        form: form.clone(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });

    let invalid_grant = (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_grant", "error_description": "Invalid refresh token" })),
    );

    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => (
            StatusCode::OK,
            Json(json!({
                "access_token": "BQC-exchanged",
                "token_type": "Bearer",
                "refresh_token": "AQD-first",
                "scope": "user-top-read user-read-private",
                "expires_in": 3600
            })),
        ),
        Some("refresh_token") => {
            let refresh_token = form.get("refresh_token").cloned().unwrap_or_default();
            match refresh_token.as_str() {
                "AQD-valid" => (
                    StatusCode::OK,
                    Json(json!({
                        "access_token": "BQC-refreshed",
                        "token_type": "Bearer",
                        "scope": "user-top-read",
                        "expires_in": 3600
                    })),
                ),
                "AQD-rotating" => {
                    let first_use = state
                        .used_refresh_tokens
                        .lock()
                        .unwrap()
                        .insert(refresh_token.clone());
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    if !first_use {
                        return invalid_grant;
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "access_token": "BQC-rotated",
                            "token_type": "Bearer",
                            "refresh_token": "AQD-next",
                            "scope": "user-top-read",
                            "expires_in": 3600
                        })),
                    )
                }
                "AQD-broken" => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "server_error" })),
                ),
                _ => invalid_grant,
            }
        }
        _ => invalid_grant,
    }
}

/// OAuth settings whose token URL points at `endpoint`.
pub fn oauth_settings_with_endpoint(dir: &Path, endpoint: &TokenEndpoint) -> Settings {
    Settings {
        spotify_token_url: endpoint.url.clone(),
        ..oauth_settings_for(dir)
    }
}
