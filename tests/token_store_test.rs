mod support;

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use spotools::{
    errors::ToolError,
    management::{
        InMemoryTokenStore, PENDING_AUTHORIZATION_TTL_SECS, PendingAuthorization,
        PendingAuthorizations, TokenStore,
    },
    spotify::{OAuthClient, OAuthFlow},
    types::{TOKEN_EXPIRY_MARGIN_SECS, Token},
    utils,
};
use support::{TokenEndpoint, oauth_settings_for, oauth_settings_with_endpoint, settings_for};

fn token(access_token: &str, obtained_at: u64, expires_in: u64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: format!("{access_token}-refresh"),
        scope: "user-top-read user-read-private".to_string(),
        expires_in,
        obtained_at,
    }
}

fn pending(agent_id: &str, created_at: u64) -> PendingAuthorization {
    PendingAuthorization {
        agent_id: agent_id.to_string(),
        code_verifier: utils::generate_code_verifier(),
        created_at,
    }
}

fn oauth_flow(tokens: Arc<dyn TokenStore>) -> (tempfile::TempDir, OAuthFlow) {
    let dir = tempfile::tempdir().unwrap();
    let client = OAuthClient::from_settings(&oauth_settings_for(dir.path()))
        .expect("oauth settings are complete");
    (dir, OAuthFlow::new(client, tokens))
}

fn endpoint_flow(
    endpoint: &TokenEndpoint,
    tokens: Arc<dyn TokenStore>,
) -> (tempfile::TempDir, OAuthFlow) {
    let dir = tempfile::tempdir().unwrap();
    let client = OAuthClient::from_settings(&oauth_settings_with_endpoint(dir.path(), endpoint))
        .expect("oauth settings are complete");
    (dir, OAuthFlow::new(client, tokens))
}

// Expired access token with the given refresh token
fn stale_with_refresh(refresh_token: &str) -> Token {
    Token {
        refresh_token: refresh_token.to_string(),
        ..token("BQC-stale", 0, 3_600)
    }
}

fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode("client-123:secret-456"))
}

fn query_param(url: &reqwest::Url, name: &str) -> String {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

#[test]
fn test_token_expiry_margin() {
    let token = token("BQC", 1_000, 3_600);
    assert_eq!(token.expires_at(), 4_600);

    assert!(!token.is_expired(1_000));
    assert!(!token.is_expired(4_600 - TOKEN_EXPIRY_MARGIN_SECS - 1));
    // Inside the margin the token is treated as expired already
    assert!(token.is_expired(4_600 - TOKEN_EXPIRY_MARGIN_SECS));
    assert!(token.is_expired(4_600));
}

#[test]
fn test_store_insert_get_remove() {
    let store = InMemoryTokenStore::new();
    assert!(store.is_empty());
    assert_eq!(store.get("agent-1"), None);

    store.insert("agent-1", token("first", 1_000, 3_600));
    store.insert("agent-2", token("other", 1_000, 3_600));
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("agent-1").unwrap().access_token, "first");

    // A new token replaces the previous one
    store.insert("agent-1", token("second", 2_000, 3_600));
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("agent-1").unwrap().access_token, "second");

    assert_eq!(store.remove("agent-1").unwrap().access_token, "second");
    assert_eq!(store.get("agent-1"), None);
    assert_eq!(store.remove("agent-1"), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_token_expiry_saturates() {
    let token = token("BQC", 1_000, u64::MAX);
    assert_eq!(token.expires_at(), u64::MAX);
    assert!(!token.is_expired(utils::now_timestamp()));
    assert!(token.is_expired(u64::MAX));
}

#[test]
fn test_store_purge_expired() {
    let store = InMemoryTokenStore::new();
    let mut stale = token("stale", 0, 3_600);
    stale.refresh_token.clear();
    store.insert("stale", stale);
    store.insert("refreshable", token("refreshable", 0, 3_600));
    store.insert("fresh", token("fresh", 10_000, 3_600));

    // Expired tokens that can still be refreshed stay
    assert_eq!(store.purge_expired(10_000), 1);
    assert_eq!(store.get("stale"), None);
    assert!(store.get("refreshable").is_some());
    assert!(store.get("fresh").is_some());
    assert_eq!(store.purge_expired(10_000), 0);
}

#[test]
fn test_store_is_shared_across_threads() {
    let store = Arc::new(InMemoryTokenStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.insert(&format!("agent-{i}"), token(&format!("t{i}"), 0, 3_600));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.len(), 8);
}

#[test]
fn test_pending_take_is_single_use() {
    let pending_auths = PendingAuthorizations::new();
    let entry = pending("agent-1", 1_000);
    pending_auths.insert("state-a".to_string(), entry.clone(), 1_000);

    assert_eq!(pending_auths.take("state-b", 1_001), None);
    assert_eq!(pending_auths.take("state-a", 1_001), Some(entry));
    assert_eq!(pending_auths.take("state-a", 1_002), None);
    assert!(pending_auths.is_empty());
}

#[test]
fn test_pending_expired_entries_are_dropped() {
    let pending_auths = PendingAuthorizations::new();
    pending_auths.insert("old".to_string(), pending("agent-1", 0), 0);
    pending_auths.insert("late".to_string(), pending("agent-2", 0), 0);

    // Taking after the TTL yields nothing
    assert_eq!(
        pending_auths.take("late", PENDING_AUTHORIZATION_TTL_SECS),
        None
    );

    // Inserting purges whatever already expired
    pending_auths.insert(
        "new".to_string(),
        pending("agent-3", PENDING_AUTHORIZATION_TTL_SECS),
        PENDING_AUTHORIZATION_TTL_SECS,
    );
    assert_eq!(pending_auths.len(), 1);
    assert!(
        pending_auths
            .take("new", PENDING_AUTHORIZATION_TTL_SECS + 1)
            .is_some()
    );
}

#[test]
fn test_oauth_client_requires_client_id_and_base_url() {
    let dir = tempfile::tempdir().unwrap();
    assert!(OAuthClient::from_settings(&settings_for(dir.path())).is_none());

    let mut settings = oauth_settings_for(dir.path());
    settings.base_url = None;
    assert!(OAuthClient::from_settings(&settings).is_none());

    let client = OAuthClient::from_settings(&oauth_settings_for(dir.path())).unwrap();
    assert_eq!(
        client.redirect_uri(),
        "https://tools.example.test/oauth2/callback/spotify"
    );
}

#[test]
fn test_begin_registers_pending_state() {
    let (_dir, flow) = oauth_flow(Arc::new(InMemoryTokenStore::new()));

    let first = flow.begin("agent-1").unwrap();
    let second = flow.begin("agent-1").unwrap();
    assert_ne!(first, second);
    assert_eq!(flow.pending().len(), 2);

    let state = query_param(&first, "state");
    let challenge = query_param(&first, "code_challenge");

    let entry = flow
        .pending()
        .take(&state, utils::now_timestamp())
        .unwrap();
    assert_eq!(entry.agent_id, "agent-1");
    assert_eq!(utils::generate_code_challenge(&entry.code_verifier), challenge);
}

#[tokio::test]
async fn test_complete_rejects_unknown_state() {
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = oauth_flow(Arc::clone(&tokens));

    let err = flow.complete("never-issued", "code").await.unwrap_err();
    assert_eq!(err.kind(), spotools::errors::ErrorKind::OAuth);
    assert!(tokens.is_empty());
}

#[tokio::test]
async fn test_valid_access_token_without_refresh() {
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = oauth_flow(Arc::clone(&tokens));

    assert_eq!(flow.valid_access_token("agent-1").await, None);

    tokens.insert("agent-1", token("BQC-live", utils::now_timestamp(), 3_600));
    assert_eq!(
        flow.valid_access_token("agent-1").await.as_deref(),
        Some("BQC-live")
    );
}

#[tokio::test]
async fn test_unreachable_token_endpoint_keeps_token() {
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = oauth_flow(Arc::clone(&tokens));

    // The token URL in the test settings points at a closed port
    tokens.insert("agent-1", token("BQC-stale", 0, 3_600));
    assert_eq!(flow.valid_access_token("agent-1").await, None);
    assert_eq!(tokens.get("agent-1").unwrap().access_token, "BQC-stale");
}

#[tokio::test]
async fn test_server_error_keeps_token() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    tokens.insert("agent-1", stale_with_refresh("AQD-broken"));
    assert_eq!(flow.valid_access_token("agent-1").await, None);
    assert!(tokens.get("agent-1").is_some());
}

#[tokio::test]
async fn test_rejected_refresh_forgets_token() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    tokens.insert("agent-1", stale_with_refresh("AQD-revoked"));
    assert_eq!(flow.valid_access_token("agent-1").await, None);
    assert!(tokens.get("agent-1").is_none());
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_rotated() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    tokens.insert("agent-1", stale_with_refresh("AQD-valid"));
    assert_eq!(
        flow.valid_access_token("agent-1").await.as_deref(),
        Some("BQC-refreshed")
    );

    let stored = tokens.get("agent-1").unwrap();
    assert_eq!(stored.access_token, "BQC-refreshed");
    assert_eq!(stored.refresh_token, "AQD-valid");
    assert!(!stored.is_expired(utils::now_timestamp()));

    let calls = endpoint.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].form["grant_type"], "refresh_token");
    assert_eq!(calls[0].form["refresh_token"], "AQD-valid");
    assert_eq!(calls[0].form["client_id"], "client-123");
    assert_eq!(calls[0].authorization.as_deref(), Some(basic_auth().as_str()));
}

#[tokio::test]
async fn test_concurrent_refresh_uses_one_rotation() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    tokens.insert("agent-1", stale_with_refresh("AQD-rotating"));
    let (a, b) = tokio::join!(
        flow.valid_access_token("agent-1"),
        flow.valid_access_token("agent-1")
    );

    assert_eq!(a.as_deref(), Some("BQC-rotated"));
    assert_eq!(b.as_deref(), Some("BQC-rotated"));

    let stored = tokens.get("agent-1").unwrap();
    assert_eq!(stored.access_token, "BQC-rotated");
    assert_eq!(stored.refresh_token, "AQD-next");
    assert_eq!(endpoint.calls().len(), 1);
}

#[tokio::test]
async fn test_complete_stores_exchanged_token() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    let url = flow.begin("agent-1").unwrap();
    let state = query_param(&url, "state");
    let challenge = query_param(&url, "code_challenge");

    let agent_id = flow.complete(&state, "good-code").await.unwrap();
    assert_eq!(agent_id, "agent-1");
    assert!(flow.pending().is_empty());

    let stored = tokens.get("agent-1").unwrap();
    assert_eq!(stored.access_token, "BQC-exchanged");
    assert_eq!(stored.refresh_token, "AQD-first");
    assert_eq!(stored.scope, "user-top-read user-read-private");
    assert_eq!(stored.expires_in, 3_600);

    let calls = endpoint.calls();
    assert_eq!(calls.len(), 1);
    let form = &calls[0].form;
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "good-code");
    assert_eq!(
        form["redirect_uri"],
        "https://tools.example.test/oauth2/callback/spotify"
    );
    // The verifier sent matches the challenge in the authorization link
    assert_eq!(utils::generate_code_challenge(&form["code_verifier"]), challenge);
    assert_eq!(calls[0].authorization.as_deref(), Some(basic_auth().as_str()));

    // The state was consumed
    let err = flow.complete(&state, "good-code").await.unwrap_err();
    assert_eq!(err.kind(), spotools::errors::ErrorKind::OAuth);
}

#[tokio::test]
async fn test_complete_with_rejected_code() {
    let endpoint = TokenEndpoint::spawn().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = endpoint_flow(&endpoint, Arc::clone(&tokens));

    let url = flow.begin("agent-1").unwrap();
    let err = flow
        .complete(&query_param(&url, "state"), "bad-code")
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::TokenRejected { status: 400, .. }));
    assert!(tokens.is_empty());
}

#[test]
fn test_status() {
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
    let (_dir, flow) = oauth_flow(Arc::clone(&tokens));

    let status = flow.status("agent-1");
    assert!(!status.authorized);
    assert!(!status.expired);
    assert_eq!(status.scope, None);

    let now = utils::now_timestamp();
    tokens.insert("agent-1", token("BQC", now, 3_600));
    let status = flow.status("agent-1");
    assert_eq!(status.agent_id, "agent-1");
    assert!(status.authorized);
    assert!(!status.expired);
    assert_eq!(status.expires_at, Some(now + 3_600));
    assert_eq!(
        status.scope.as_deref(),
        Some("user-top-read user-read-private")
    );

    tokens.insert("agent-2", token("BQC-old", 0, 3_600));
    assert!(flow.status("agent-2").expired);
}
