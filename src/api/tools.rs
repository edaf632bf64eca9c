use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    errors::ToolError,
    normalize,
    registry::ToolDescriptor,
    state::AppState,
    types::{AgentInfo, AuthorizationStatus},
    warning,
};

pub const AGENT_ID_HEADER: &str = "x-agent-id";
pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn list_tools(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<ToolDescriptor>> {
    Json(state.dispatcher.registry().tools().to_vec())
}

pub async fn invoke_tool(
    Path(tool_id): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let agent = match authenticate(&headers, &state) {
        Ok(agent) => agent,
        Err(err) => return rejected(&tool_id, err),
    };
    let input = match parse_body(&body) {
        Ok(input) => input,
        Err(err) => return rejected(&tool_id, err),
    };

    let dispatched = state.dispatcher.dispatch(&tool_id, &agent, input).await;
    let status = dispatched
        .error
        .as_ref()
        .map_or(StatusCode::OK, |err| err.kind().status_code());
    (status, Json(dispatched.response)).into_response()
}

pub async fn oauth_status(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<AuthorizationStatus>, Response> {
    let agent = authenticate(&headers, &state).map_err(|err| rejected("oauth2-status", err))?;
    let oauth = state.dispatcher.oauth().ok_or_else(|| {
        rejected(
            "oauth2-status",
            ToolError::OAuth("spotify authorization is not configured".into()),
        )
    })?;
    Ok(Json(oauth.status(&agent.id)))
}

/// Checks the API key (when one is configured) and extracts the caller.
fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AgentInfo, ToolError> {
    if let Some(expected) = &state.settings.api_key {
        let presented = header_value(headers, API_KEY_HEADER);
        if presented.as_deref() != Some(expected.as_str()) {
            return Err(ToolError::Unauthorized("missing or invalid api key".into()));
        }
    }

    let id = header_value(headers, AGENT_ID_HEADER)
        .ok_or_else(|| ToolError::Validation(format!("missing {AGENT_ID_HEADER} header")))?;
    Ok(AgentInfo { id })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// An empty body is accepted as `null`; tools that need input reject it later.
fn parse_body(body: &Bytes) -> Result<Value, ToolError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ToolError::Validation(format!("invalid JSON body: {e}")))
}

fn rejected(tool_id: &str, err: ToolError) -> Response {
    warning!("Rejected call to {}: {}", tool_id, err);
    let status = err.kind().status_code();
    (status, Json(normalize::failure(&err))).into_response()
}
