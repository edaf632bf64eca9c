//! Declared tools.
//!
//! The registry is the catalogue the agent platform reads from `GET /tools`:
//! every tool with its id, display name, description, JSON schemas for input
//! and output, and price. It also tells the dispatcher which helper script a
//! tool runs and how its output is normalized.

use schemars::{JsonSchema, schema_for};
use serde::Serialize;
use serde_json::Value;

use crate::types::{
    ArtistInfoOutput, ArtistInput, AuthorizeInput, AuthorizeOutput, FollowersOutput,
    GenresOutput, Pricing, ToolTableRow, TopTracksOutput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    ArtistInfo,
    TopTracks,
    Genres,
    Followers,
    SpotifyOAuth,
}

impl ToolKind {
    /// Helper script run by the tool, relative to the scripts directory.
    pub fn script(self) -> Option<&'static str> {
        match self {
            ToolKind::ArtistInfo => Some("get_info.py"),
            ToolKind::TopTracks => Some("get_top_tracks.py"),
            ToolKind::Genres => Some("get_genres.py"),
            ToolKind::Followers => Some("get_followers.py"),
            ToolKind::SpotifyOAuth => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub kind: ToolKind,
    pub input: Value,
    pub output: Value,
    pub pricing: Pricing,
}

impl ToolDescriptor {
    fn new<I: JsonSchema, O: JsonSchema>(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        kind: ToolKind,
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind,
            input: schema_for!(I).to_value(),
            output: schema_for!(O).to_value(),
            pricing: Pricing {
                price_per_use: 0.0,
                currency: "USD",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            tools: vec![
                ToolDescriptor::new::<AuthorizeInput, AuthorizeOutput>(
                    "oauth2-spotify",
                    "Authorize Spotify",
                    "Returns a link that connects the caller's Spotify account",
                    ToolKind::SpotifyOAuth,
                ),
                ToolDescriptor::new::<ArtistInput, ArtistInfoOutput>(
                    "get-info",
                    "Get Artist Info",
                    "Fetches name, followers, genres, popularity and image of an artist",
                    ToolKind::ArtistInfo,
                ),
                ToolDescriptor::new::<ArtistInput, TopTracksOutput>(
                    "get-top-tracks",
                    "Get Artist Top Tracks",
                    "Fetches listed top 10 tracks of an artist",
                    ToolKind::TopTracks,
                ),
                ToolDescriptor::new::<ArtistInput, FollowersOutput>(
                    "get-followers",
                    "Get Artist Followers",
                    "Fetches followers of an artist",
                    ToolKind::Followers,
                ),
                ToolDescriptor::new::<ArtistInput, GenresOutput>(
                    "get-genres",
                    "Get Artist Genres",
                    "Fetches listed genres of an artist",
                    ToolKind::Genres,
                ),
            ],
        }
    }
}

impl ToolRegistry {
    pub fn get(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn table_rows(&self) -> Vec<ToolTableRow> {
        self.tools
            .iter()
            .map(|tool| ToolTableRow {
                id: tool.id.to_string(),
                name: tool.name.to_string(),
                description: tool.description.to_string(),
            })
            .collect()
    }
}
