//! Spotify Artist Tools Library
//!
//! This library implements an HTTP tool service that answers artist questions
//! (info, top tracks, genres, followers) for an agent platform. Each tool call
//! is validated, handed to an external helper process, and the helper's output
//! is normalized into display text, structured data and a UI payload.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for tools, health and the OAuth callback
//! - `bridge` - Helper process invocation with per-request artifacts
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `dispatch` - Request validation and the tool pipeline
//! - `errors` - Tagged tool error kinds
//! - `management` - Token store and pending authorizations
//! - `normalize` - Helper result parsing and formatting
//! - `registry` - Declared tools and their schemas
//! - `server` - HTTP server bootstrap
//! - `spotify` - Spotify OAuth2 client
//! - `types` - Data structures and type definitions
//! - `ui` - Presentation payload builders
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotools::{config, server, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> spotools::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     server::start_api_server(AppState::new(settings).into()).await
//! }
//! ```

pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod management;
pub mod normalize;
pub mod registry;
pub mod server;
pub mod spotify;
pub mod state;
pub mod types;
pub mod ui;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the outer plumbing (server start, CLI commands) where any error
/// is reported and ends the command. Tool calls use [`errors::ToolError`]
/// instead so failures keep their kind.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("User / Agent {} requested genres for {}", agent, artist);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Tokens stored for agent: {}", agent_id);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for failures during startup where the service cannot continue. Tool
/// failures are never fatal and go through [`warning!`] instead.
///
/// # Example
///
/// ```
/// error!("Failed to bind server address: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Tool get-info failed for agent {}: {}", agent, err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
