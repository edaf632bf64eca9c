//! # API Module
//!
//! HTTP endpoints of the artist tool service.
//!
//! ## Endpoints
//!
//! ### Tools
//!
//! - [`list_tools`] - `GET /tools`, the registry with input/output schemas
//! - [`invoke_tool`] - `POST /tools/{id}`, runs one tool. The caller is named
//!   by the `x-agent-id` header; when an API key is configured it must be sent
//!   as `x-api-key`. The body is the tool input as JSON.
//!
//! Tool responses always have the `{ text, data, ui }` shape. Failed calls use
//! the uniform error response and an HTTP status derived from the error kind.
//!
//! ### Authentication
//!
//! - [`callback`] - `GET /oauth2/callback/spotify`, completes an authorization
//!   started with the `oauth2-spotify` tool
//! - [`oauth_status`] - `GET /oauth2/spotify/status`, whether the caller has a
//!   stored token
//!
//! ### Monitoring
//!
//! - [`health`] - `GET /health`, status and version

mod callback;
mod health;
mod tools;

pub use callback::callback;
pub use health::health;
pub use tools::{AGENT_ID_HEADER, API_KEY_HEADER, invoke_tool, list_tools, oauth_status};
