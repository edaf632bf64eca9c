use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use crate::{
    config::Settings, dispatch::Dispatcher, error, management::InMemoryTokenStore, success,
    types::AgentInfo, warning,
};

/// Runs one artist tool locally and prints the response as JSON.
///
/// Goes through the same dispatcher the HTTP service uses, so helper scripts,
/// validation and normalization behave exactly as they would for an agent.
/// Useful for checking a helper installation without standing up the server.
///
/// # Arguments
///
/// * `settings` - Loaded service settings (helper directory, interpreter, timeout)
/// * `tool_id` - Registered tool id, e.g. `get-info`
/// * `artist` - Artist passed to the helper
/// * `agent_id` - Caller identity used in log lines
///
/// # Exit Status
///
/// Exits with status 1 when the tool call fails; the uniform error response
/// is still printed first.
///
/// # Example
///
/// ```bash
/// spotools invoke get-genres "Ado"
/// ```
pub async fn invoke(settings: Settings, tool_id: String, artist: String, agent_id: String) {
    let dispatcher = Dispatcher::from_settings(&settings, Arc::new(InMemoryTokenStore::new()));
    let agent = AgentInfo { id: agent_id };

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Running {}...", tool_id));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let dispatched = dispatcher
        .dispatch(&tool_id, &agent, json!({ "artist": artist }))
        .await;
    pb.finish_and_clear();

    match serde_json::to_string_pretty(&dispatched.response) {
        Ok(out) => println!("{}", out),
        Err(e) => warning!("Failed to render response: {}", e),
    }

    match dispatched.error {
        None => success!("{} finished", tool_id),
        Some(err) => error!("{} failed ({}): {}", tool_id, err.kind().as_str(), err),
    }
}
