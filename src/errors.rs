//! Tool error kinds.
//!
//! Every failure inside a tool call is a [`ToolError`]. The dispatcher turns it
//! into the uniform error response, but the [`ErrorKind`] travels along in the
//! response body and in the HTTP status so callers can tell a bad request from
//! a broken helper.

use axum::http::StatusCode;
use serde::Serialize;

/// Coarse classification of a [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    UnknownTool,
    Subprocess,
    Timeout,
    Artifact,
    Parse,
    EmptyResult,
    #[serde(rename = "oauth")]
    OAuth,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::UnknownTool => "unknown_tool",
            Self::Subprocess => "subprocess",
            Self::Timeout => "timeout",
            Self::Artifact => "artifact",
            Self::Parse => "parse",
            Self::EmptyResult => "empty_result",
            Self::OAuth => "oauth",
            Self::Internal => "internal",
        }
    }

    /// HTTP status used when the error is returned over the tool endpoint.
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownTool => StatusCode::NOT_FOUND,
            Self::Subprocess | Self::Artifact | Self::Parse | Self::EmptyResult | Self::OAuth => {
                StatusCode::BAD_GATEWAY
            }
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("failed to start helper {script}: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("helper {script} wrote to stderr: {stderr}")]
    Stderr { script: String, stderr: String },

    #[error("helper {script} exited with status {code:?}")]
    ExitStatus { script: String, code: Option<i32> },

    #[error("helper {script} did not finish within {seconds}s")]
    Timeout { script: String, seconds: u64 },

    #[error("cannot read artifact {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed helper output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("helper returned no result for {0}")]
    EmptyResult(String),

    #[error("oauth2: {0}")]
    OAuth(String),

    /// The token endpoint refused the grant (4xx), e.g. a used or revoked
    /// refresh token. Transport failures stay [`ToolError::OAuth`].
    #[error("oauth2: token endpoint rejected the grant ({status}): {body}")]
    TokenRejected { status: u16, body: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::Spawn { .. } | Self::Stderr { .. } | Self::ExitStatus { .. } => {
                ErrorKind::Subprocess
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Artifact { .. } => ErrorKind::Artifact,
            Self::Parse(_) => ErrorKind::Parse,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::OAuth(_) | Self::TokenRejected { .. } => ErrorKind::OAuth,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::OAuth(err.to_string())
    }
}
