//! Turns helper output into tool responses.
//!
//! Artist info and top tracks read the artifact written by the helper; genres
//! and followers use the helper's stdout as is. All normalizers trim
//! surrounding whitespace and treat an empty result as a failure.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    bridge::HelperRun,
    errors::ToolError,
    types::{
        ArtistInfoArtifact, ArtistInfoOutput, FollowersOutput, GenresOutput, ToolResponse,
        TopTracksOutput,
    },
    ui::{CardBuilder, ImageCardBuilder, ImageGalleryBuilder, error_card},
    utils,
};

pub const ERROR_TEXT: &str = "An error occurred while fetching the info.";

/// Reads and parses the JSON artifact at `path`.
pub async fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ToolError> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|source| ToolError::Artifact {
            path: path.display().to_string(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}

/// Trimmed stdout, or [`ToolError::EmptyResult`] if nothing is left.
pub fn plain_text(run: &HelperRun, artist: &str) -> Result<String, ToolError> {
    let text = run.result.stdout.trim();
    if text.is_empty() {
        return Err(ToolError::EmptyResult(artist.to_string()));
    }
    Ok(text.to_string())
}

pub async fn artist_info(run: &HelperRun) -> Result<ToolResponse, ToolError> {
    let artifact: ArtistInfoArtifact = read_artifact(&run.artifact_path()).await?;
    artist_info_response(artifact)
}

pub fn artist_info_response(artifact: ArtistInfoArtifact) -> Result<ToolResponse, ToolError> {
    let output = ArtistInfoOutput {
        name: artifact.name,
        followers: artifact.followers,
        genres: artifact.genres,
        popularity: artifact.popularity,
        image: artifact.image.unwrap_or_default(),
    };

    let description = format!(
        "Followers: {}\nGenres: {}\nPopularity: {}",
        utils::format_grouped(output.followers),
        utils::format_genres(&output.genres),
        output.popularity
    );

    let ui = CardBuilder::new()
        .page()
        .title("Artist information")
        .child(
            ImageCardBuilder::new(output.image.clone())
                .aspect_ratio("square")
                .title(output.name.clone())
                .description(description)
                .image_alt("Artist Image")
                .build(),
        )
        .build();

    Ok(ToolResponse {
        text: "Artist information".to_string(),
        data: serde_json::to_value(&output)?,
        ui,
    })
}

pub async fn top_tracks(run: &HelperRun, artist: &str) -> Result<ToolResponse, ToolError> {
    let top_tracks = plain_text(run, artist)?;
    let img_urls: Vec<String> = read_artifact(&run.artifact_path()).await?;
    top_tracks_response(top_tracks, img_urls)
}

pub fn top_tracks_response(
    top_tracks: String,
    img_urls: Vec<String>,
) -> Result<ToolResponse, ToolError> {
    let ui = CardBuilder::new()
        .page()
        .title("Artist Top Tracks")
        .child(
            ImageGalleryBuilder::new()
                .title("Top Tracks")
                .description("Top 10 tracks of the artist")
                .images(img_urls.iter().cloned())
                .columns(2)
                .build(),
        )
        .build();

    let output = TopTracksOutput {
        top_tracks,
        img_urls,
    };

    Ok(ToolResponse {
        text: output.top_tracks.clone(),
        data: serde_json::to_value(&output)?,
        ui,
    })
}

pub fn genres(run: &HelperRun, artist: &str) -> Result<ToolResponse, ToolError> {
    let genres = plain_text(run, artist)?;
    let ui = CardBuilder::new()
        .title("Artist genres")
        .content(genres.clone())
        .build();
    Ok(ToolResponse {
        data: serde_json::to_value(GenresOutput {
            genres: genres.clone(),
        })?,
        text: genres,
        ui,
    })
}

pub fn followers(run: &HelperRun, artist: &str) -> Result<ToolResponse, ToolError> {
    let followers = plain_text(run, artist)?;
    let ui = CardBuilder::new()
        .title("Artist followers")
        .content(followers.clone())
        .build();
    Ok(ToolResponse {
        data: serde_json::to_value(FollowersOutput {
            followers: followers.clone(),
        })?,
        text: followers,
        ui,
    })
}

/// The response every failed tool call gets. The error kind and message are
/// kept in `data.error`.
pub fn failure(err: &ToolError) -> ToolResponse {
    ToolResponse {
        text: ERROR_TEXT.to_string(),
        data: serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": format!("Error: Unable to fetch spotify data. {err}"),
            }
        }),
        ui: error_card(),
    }
}
