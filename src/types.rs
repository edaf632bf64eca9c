use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// Seconds before the real expiry at which a token is already treated as expired.
pub const TOKEN_EXPIRY_MARGIN_SECS: u64 = 240;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    pub fn expires_at(&self) -> u64 {
        self.obtained_at.saturating_add(self.expires_in)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_add(TOKEN_EXPIRY_MARGIN_SECS) >= self.expires_at()
    }
}

/// Raw token endpoint response. Spotify omits `refresh_token` on refresh when
/// it does not rotate it.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Identity of the agent (or user) invoking a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    pub id: String,
}

/// Input accepted by every artist tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[schemars(description = "Input parameters for the spotify request")]
pub struct ArtistInput {
    #[schemars(description = "Artist spotify id")]
    pub artist: String,
}

/// Input of the OAuth2 authorization tool. Takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AuthorizeInput {}

/// A validated request for one artist tool.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub artist: String,
    pub agent: AgentInfo,
}

/// Output of a single helper process run.
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Artifact written by the artist info helper.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInfoArtifact {
    pub name: String,
    pub followers: u64,
    pub genres: Vec<String>,
    pub popularity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Artist information")]
pub struct ArtistInfoOutput {
    #[schemars(description = "Information about artist")]
    pub name: String,
    #[schemars(description = "Followers of the artist")]
    pub followers: u64,
    #[schemars(description = "Genres of the artist")]
    pub genres: Vec<String>,
    #[schemars(description = "Popularity of the artist")]
    pub popularity: u32,
    #[schemars(description = "Image URL of the artist")]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Top Tracks information")]
pub struct TopTracksOutput {
    #[schemars(description = "Top tracks of the artist")]
    pub top_tracks: String,
    #[schemars(description = "Image URLs of the top tracks")]
    pub img_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Genre information")]
pub struct GenresOutput {
    #[schemars(description = "Genres of the artist")]
    pub genres: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Follower information")]
pub struct FollowersOutput {
    #[schemars(description = "Followers of the artist")]
    pub followers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Authorization link for the Spotify account")]
pub struct AuthorizeOutput {
    #[schemars(description = "OAuth2 provider name")]
    pub provider: String,
    #[schemars(description = "URL the user opens to grant access")]
    pub authorization_url: String,
}

/// Response returned for every tool call, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub text: String,
    pub data: Value,
    pub ui: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pricing {
    #[serde(rename = "pricePerUse")]
    pub price_per_use: f64,
    pub currency: &'static str,
}

#[derive(Tabled)]
pub struct ToolTableRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationStatus {
    pub agent_id: String,
    pub authorized: bool,
    pub expired: bool,
    pub scope: Option<String>,
    pub expires_at: Option<u64>,
}
