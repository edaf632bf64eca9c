//! Request dispatch.
//!
//! The [`Dispatcher`] is the single entry point for tool calls, used by both
//! the HTTP handler and the `invoke` CLI command. For a data tool it
//!
//! 1. validates the JSON input into an [`ArtistInput`],
//! 2. logs who asked for what,
//! 3. runs the tool's helper through the [`ProcessBridge`],
//! 4. normalizes the helper's output into a [`ToolResponse`].
//!
//! Any failure along the way becomes the uniform error response built by
//! [`normalize::failure`], tagged with the error's kind.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    bridge::{ACCESS_TOKEN_ENV, ProcessBridge},
    config::Settings,
    errors::ToolError,
    info,
    management::TokenStore,
    normalize,
    registry::{ToolKind, ToolRegistry},
    spotify::{OAuthClient, OAuthFlow},
    types::{AgentInfo, ArtistInput, AuthorizeInput, AuthorizeOutput, ToolRequest, ToolResponse},
    ui::CardBuilder,
    warning,
};

/// Outcome of a dispatched call: the response body plus the error, if any,
/// that produced it.
#[derive(Debug)]
pub struct Dispatched {
    pub response: ToolResponse,
    pub error: Option<ToolError>,
}

impl Dispatched {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Dispatcher {
    registry: ToolRegistry,
    bridge: ProcessBridge,
    oauth: Option<Arc<OAuthFlow>>,
    forward_user_tokens: bool,
}

impl Dispatcher {
    pub fn new(
        registry: ToolRegistry,
        bridge: ProcessBridge,
        oauth: Option<Arc<OAuthFlow>>,
        forward_user_tokens: bool,
    ) -> Self {
        Self {
            registry,
            bridge,
            oauth,
            forward_user_tokens,
        }
    }

    /// Wires a dispatcher from settings. The OAuth2 tool is only enabled
    /// when a Spotify client id and a public base URL are configured.
    pub fn from_settings(settings: &Settings, tokens: Arc<dyn TokenStore>) -> Self {
        let oauth = OAuthClient::from_settings(settings)
            .map(|client| Arc::new(OAuthFlow::new(client, tokens)));
        Self::new(
            ToolRegistry::default(),
            ProcessBridge::from_settings(settings),
            oauth,
            settings.forward_user_tokens,
        )
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &ProcessBridge {
        &self.bridge
    }

    pub fn oauth(&self) -> Option<&Arc<OAuthFlow>> {
        self.oauth.as_ref()
    }

    /// Runs `tool_id` for `agent` and always produces a response. Failures
    /// are logged and turned into the uniform error response.
    pub async fn dispatch(&self, tool_id: &str, agent: &AgentInfo, input: Value) -> Dispatched {
        match self.try_dispatch(tool_id, agent, input).await {
            Ok(response) => Dispatched {
                response,
                error: None,
            },
            Err(err) => {
                warning!(
                    "Tool {} failed for agent {} ({}): {}",
                    tool_id,
                    agent.id,
                    err.kind().as_str(),
                    err
                );
                Dispatched {
                    response: normalize::failure(&err),
                    error: Some(err),
                }
            }
        }
    }

    pub async fn try_dispatch(
        &self,
        tool_id: &str,
        agent: &AgentInfo,
        input: Value,
    ) -> Result<ToolResponse, ToolError> {
        let tool = self
            .registry
            .get(tool_id)
            .ok_or_else(|| ToolError::UnknownTool(tool_id.to_string()))?;

        if tool.kind == ToolKind::SpotifyOAuth {
            return self.authorize(agent, input);
        }

        let request = validate(agent, input)?;
        info!(
            "User / Agent {} requested {} for {}",
            request.agent.id, tool.id, request.artist
        );
        self.run_artist_tool(tool.kind, &request).await
    }

    async fn run_artist_tool(
        &self,
        kind: ToolKind,
        request: &ToolRequest,
    ) -> Result<ToolResponse, ToolError> {
        let script = kind
            .script()
            .ok_or_else(|| ToolError::Internal(format!("{kind:?} has no helper script")))?;

        let mut env = Vec::new();
        if self.forward_user_tokens {
            if let Some(oauth) = &self.oauth {
                if let Some(token) = oauth.valid_access_token(&request.agent.id).await {
                    env.push((ACCESS_TOKEN_ENV, token));
                }
            }
        }

        let run = self.bridge.run(script, &request.artist, &env).await?;
        match kind {
            ToolKind::ArtistInfo => normalize::artist_info(&run).await,
            ToolKind::TopTracks => normalize::top_tracks(&run, &request.artist).await,
            ToolKind::Genres => normalize::genres(&run, &request.artist),
            ToolKind::Followers => normalize::followers(&run, &request.artist),
            ToolKind::SpotifyOAuth => Err(ToolError::Internal(
                "authorization tool has no helper output".into(),
            )),
        }
    }

    fn authorize(&self, agent: &AgentInfo, input: Value) -> Result<ToolResponse, ToolError> {
        let _: AuthorizeInput = if input.is_null() {
            AuthorizeInput::default()
        } else {
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?
        };

        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| ToolError::OAuth("spotify authorization is not configured".into()))?;

        let url = oauth.begin(&agent.id)?.to_string();
        info!("User / Agent {} requested a spotify authorization link", agent.id);

        let output = AuthorizeOutput {
            provider: "spotify".to_string(),
            authorization_url: url.clone(),
        };
        Ok(ToolResponse {
            text: format!("Open this link to connect your Spotify account: {url}"),
            data: serde_json::to_value(&output)?,
            ui: CardBuilder::new()
                .title("Connect Spotify")
                .content(url)
                .build(),
        })
    }
}

/// Checks the input of an artist tool.
///
/// The artist must be a non-blank string without control characters; it is
/// handed to the helper unchanged otherwise.
pub fn validate(agent: &AgentInfo, input: Value) -> Result<ToolRequest, ToolError> {
    if agent.id.trim().is_empty() {
        return Err(ToolError::Validation("missing caller identity".into()));
    }

    let input: ArtistInput =
        serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;
    if input.artist.trim().is_empty() {
        return Err(ToolError::Validation("artist must not be empty".into()));
    }
    if input.artist.chars().any(char::is_control) {
        return Err(ToolError::Validation(
            "artist must not contain control characters".into(),
        ));
    }

    Ok(ToolRequest {
        artist: input.artist,
        agent: agent.clone(),
    })
}
