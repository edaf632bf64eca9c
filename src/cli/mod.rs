//! # CLI Module
//!
//! Command implementations behind the `spotools` binary.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the HTTP tool service
//! - [`list_tools`] - Shows the tool registry as a table or JSON
//! - [`invoke`] - Runs one tool locally through the dispatcher
//! - [`authorize`] - Gets a Spotify authorization link from a running service
//!   and opens it in the browser
//!
//! Each command reports through the crate's logging macros; fatal problems
//! end the process via `error!`.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotools serve --addr 0.0.0.0:8080
//! spotools tools
//! spotools invoke get-info "Ado"
//! spotools authorize --agent my-agent --server http://localhost:8080
//! ```

mod authorize;
mod invoke;
mod serve;
mod tools;

pub use authorize::authorize;
pub use invoke::invoke;
pub use serve::serve;
pub use tools::list_tools;
