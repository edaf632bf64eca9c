use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use reqwest::{Client, Url};
use tokio::sync::Mutex as AsyncMutex;

use crate::{
    config::Settings,
    errors::ToolError,
    management::{PendingAuthorization, PendingAuthorizations, TokenStore},
    types::{AuthorizationStatus, Token, TokenResponse},
    utils, warning,
};

/// Client for Spotify's OAuth2 endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: Option<String>,
    auth_url: String,
    token_url: String,
    redirect_uri: String,
    scope: String,
    http: Client,
}

impl OAuthClient {
    /// Builds the client from settings. Returns `None` when the service has no
    /// Spotify client id or no public base URL, in which case the OAuth2 tool
    /// is unavailable.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        Some(Self {
            client_id: settings.spotify_client_id.clone()?,
            client_secret: settings.spotify_client_secret.clone(),
            auth_url: settings.spotify_auth_url.clone(),
            token_url: settings.spotify_token_url.clone(),
            redirect_uri: settings.spotify_redirect_uri()?,
            scope: settings.spotify_scope(),
            http: Client::new(),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Authorization URL the user opens in a browser.
    ///
    /// Carries the client id, redirect URI, requested scopes, the `state`
    /// that identifies the pending authorization, and the S256 PKCE
    /// challenge derived from the pending code verifier.
    pub fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<Url, ToolError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| ToolError::OAuth(format!("invalid authorization url: {e}")))
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// Completes the authorization-code flow by sending the code together
    /// with the PKCE verifier generated when the flow started. When a client
    /// secret is configured it is sent with HTTP basic auth.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::TokenRejected`] when the token endpoint answers
    /// with a 4xx status, and [`ToolError::OAuth`] on network failures, server
    /// errors, or a response without an access token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, ToolError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = self.token_request(&form).await?;
        Ok(Token {
            access_token: response.access_token,
            refresh_token: response.refresh_token.unwrap_or_default(),
            scope: response.scope,
            expires_in: response.expires_in,
            obtained_at: utils::now_timestamp(),
        })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Spotify may or may not rotate the refresh token; when the response
    /// has none, the one passed in is kept.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, ToolError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        let response = self.token_request(&form).await?;
        Ok(Token {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            scope: response.scope,
            expires_in: response.expires_in,
            obtained_at: utils::now_timestamp(),
        })
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, ToolError> {
        let mut request = self.http.post(&self.token_url).form(form);
        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&self.client_id, Some(secret));
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.error_for_status()?.json::<TokenResponse>().await?)
    }
}

/// The OAuth2 authorization-code flow for the `spotify` provider.
///
/// Ties the [`OAuthClient`] to the pending authorizations and the token store:
/// [`OAuthFlow::begin`] hands out an authorization URL for an agent,
/// [`OAuthFlow::complete`] finishes it from the callback, and
/// [`OAuthFlow::valid_access_token`] returns a usable token, refreshing it
/// when needed.
pub struct OAuthFlow {
    client: OAuthClient,
    pending: PendingAuthorizations,
    tokens: Arc<dyn TokenStore>,
    refreshing: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OAuthFlow {
    pub fn new(client: OAuthClient, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            pending: PendingAuthorizations::new(),
            tokens,
            refreshing: Mutex::new(HashMap::new()),
        }
    }

    // One refresh per agent at a time. Spotify rotates refresh tokens, so a
    // second concurrent refresh with the same token would be rejected.
    fn refresh_lock(&self, agent_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.refreshing.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(agent_id.to_string()).or_default())
    }

    pub fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub fn pending(&self) -> &PendingAuthorizations {
        &self.pending
    }

    /// Starts an authorization for `agent_id` and returns the URL to open.
    ///
    /// A fresh PKCE verifier and `state` are generated per call, so an agent
    /// may hold several links at once; whichever is used first wins.
    pub fn begin(&self, agent_id: &str) -> Result<Url, ToolError> {
        let state = utils::generate_state();
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let url = self.client.authorization_url(&state, &code_challenge)?;

        let now = utils::now_timestamp();
        self.pending.insert(
            state,
            PendingAuthorization {
                agent_id: agent_id.to_string(),
                code_verifier,
                created_at: now,
            },
            now,
        );
        Ok(url)
    }

    /// Completes the authorization identified by `state` with the code
    /// Spotify sent to the callback, and stores the token for the agent.
    ///
    /// Returns the agent id the token was stored for.
    pub async fn complete(&self, state: &str, code: &str) -> Result<String, ToolError> {
        let pending = self
            .pending
            .take(state, utils::now_timestamp())
            .ok_or_else(|| ToolError::OAuth("unknown or expired authorization state".into()))?;

        let token = self
            .client
            .exchange_code(code, &pending.code_verifier)
            .await?;
        self.tokens.insert(&pending.agent_id, token);
        Ok(pending.agent_id)
    }

    /// Returns an access token for `agent_id` that is not about to expire.
    ///
    /// Expired tokens are refreshed and written back to the store. Refreshes
    /// for the same agent are serialized; a caller that waited on another
    /// refresh uses its result.
    ///
    /// Returns `None` when the agent has no token or the refresh failed. The
    /// token is only dropped when Spotify rejects the refresh token; after a
    /// network failure it is kept for the next attempt.
    pub async fn valid_access_token(&self, agent_id: &str) -> Option<String> {
        let token = self.tokens.get(agent_id)?;
        if !token.is_expired(utils::now_timestamp()) {
            return Some(token.access_token);
        }

        let lock = self.refresh_lock(agent_id);
        let _guard = lock.lock().await;

        let token = self.tokens.get(agent_id)?;
        if !token.is_expired(utils::now_timestamp()) {
            return Some(token.access_token);
        }
        if token.refresh_token.is_empty() {
            self.tokens.remove(agent_id);
            return None;
        }

        match self.client.refresh(&token.refresh_token).await {
            Ok(fresh) => {
                let access_token = fresh.access_token.clone();
                self.tokens.insert(agent_id, fresh);
                Some(access_token)
            }
            Err(e @ ToolError::TokenRejected { .. }) => {
                warning!("Refresh token rejected for agent {}: {}", agent_id, e);
                self.tokens.remove(agent_id);
                None
            }
            Err(e) => {
                warning!("Token refresh failed for agent {}: {}", agent_id, e);
                None
            }
        }
    }

    pub fn status(&self, agent_id: &str) -> AuthorizationStatus {
        let token = self.tokens.get(agent_id);
        let now = utils::now_timestamp();
        AuthorizationStatus {
            agent_id: agent_id.to_string(),
            authorized: token.is_some(),
            expired: token.as_ref().is_some_and(|t| t.is_expired(now)),
            scope: token.as_ref().map(|t| t.scope.clone()),
            expires_at: token.as_ref().map(Token::expires_at),
        }
    }
}
