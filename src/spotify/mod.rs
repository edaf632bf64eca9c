//! # Spotify Integration Module
//!
//! The service itself never calls the Spotify Web API for artist data; helper
//! processes do that. What lives here is the OAuth2 side: letting an agent
//! connect a Spotify account and keeping its tokens usable.
//!
//! ## Authorization Flow
//!
//! 1. **Link**: the `oauth2-spotify` tool calls [`auth::OAuthFlow::begin`],
//!    which stores a pending authorization (PKCE verifier + agent id) under a
//!    random `state` and returns the Spotify authorization URL
//! 2. **Consent**: the user grants the requested scopes in the browser
//! 3. **Callback**: Spotify redirects to `/oauth2/callback/spotify`; the
//!    handler calls [`auth::OAuthFlow::complete`] which exchanges the code
//! 4. **Storage**: the token is inserted into the injected token store under
//!    the agent id
//!
//! ## Token Lifecycle
//!
//! Tokens are treated as expired 240 seconds before Spotify says they are.
//! [`auth::OAuthFlow::valid_access_token`] refreshes them on demand; a failed
//! refresh drops the token so the agent is asked to authorize again.
//!
//! ## Endpoints Used
//!
//! - `GET https://accounts.spotify.com/authorize` - user consent
//! - `POST https://accounts.spotify.com/api/token` - code exchange and refresh
//!
//! Both URLs can be overridden through configuration.

pub mod auth;

pub use auth::{OAuthClient, OAuthFlow};
