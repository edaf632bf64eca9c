//! Helper process bridge.
//!
//! Every artist tool delegates the actual Spotify lookup to an external helper
//! script. The bridge runs one helper per request and hands back what it
//! printed. Structured results travel through an artifact file whose path is
//! unique to the request: a fresh temporary directory is created for each run
//! and the helper learns the path from [`ARTIFACT_PATH_ENV`]. The directory is
//! deleted when the returned [`HelperRun`] is dropped.
//!
//! The artist is passed as a single argv entry and the helper is started
//! without a shell, so quoting characters in the artist name reach the helper
//! verbatim.
//!
//! Running helpers are bounded by a semaphore and every run by a timeout; a
//! helper that outlives the timeout is killed.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use tempfile::TempDir;
use tokio::{process::Command, sync::Semaphore, time::timeout};

use crate::{config::Settings, errors::ToolError, types::ProcessResult};

/// Environment variable carrying the per-request artifact path.
pub const ARTIFACT_PATH_ENV: &str = "SPOTOOLS_ARTIFACT_PATH";

/// Environment variable carrying the caller's Spotify access token, if forwarded.
pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

const ARTIFACT_FILE_NAME: &str = "artifact.json";

/// A finished helper run together with its private artifact location.
#[derive(Debug)]
pub struct HelperRun {
    pub result: ProcessResult,
    workspace: TempDir,
}

impl HelperRun {
    /// Where the helper was told to write its artifact. The file only exists
    /// if the helper actually wrote it.
    pub fn artifact_path(&self) -> PathBuf {
        self.workspace.path().join(ARTIFACT_FILE_NAME)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessBridge {
    interpreter: String,
    scripts_dir: PathBuf,
    timeout: Duration,
    limiter: Arc<Semaphore>,
}

impl ProcessBridge {
    pub fn new(
        interpreter: impl Into<String>,
        scripts_dir: impl Into<PathBuf>,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            scripts_dir: scripts_dir.into(),
            timeout,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.helper_interpreter.clone(),
            settings.helper_dir.clone(),
            settings.helper_timeout,
            settings.helper_max_concurrency,
        )
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// Number of helpers that could start right now without waiting.
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Runs `script` with `artist` as its only argument and waits for it.
    ///
    /// `extra_env` is added to the helper's environment next to the artifact
    /// path.
    ///
    /// # Errors
    ///
    /// - [`ToolError::Spawn`] if the helper cannot be started
    /// - [`ToolError::Timeout`] if it runs longer than the configured timeout
    /// - [`ToolError::Stderr`] if it wrote anything to stderr, whatever its
    ///   exit status
    /// - [`ToolError::ExitStatus`] if it exited unsuccessfully without stderr
    pub async fn run(
        &self,
        script: &str,
        artist: &str,
        extra_env: &[(&str, String)],
    ) -> Result<HelperRun, ToolError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| ToolError::Internal(e.to_string()))?;

        let workspace = tempfile::Builder::new()
            .prefix("spotools-")
            .tempdir()
            .map_err(|e| ToolError::Internal(format!("cannot create artifact directory: {e}")))?;
        let artifact_path = workspace.path().join(ARTIFACT_FILE_NAME);

        let mut command = Command::new(&self.interpreter);
        command
            .arg(self.scripts_dir.join(script))
            .arg(artist)
            .env(ARTIFACT_PATH_ENV, &artifact_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in extra_env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| ToolError::Spawn {
            script: script.to_string(),
            source,
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|source| ToolError::Spawn {
                script: script.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(ToolError::Timeout {
                    script: script.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let result = ProcessResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        if !result.stderr.is_empty() {
            return Err(ToolError::Stderr {
                script: script.to_string(),
                stderr: result.stderr.trim_end().to_string(),
            });
        }
        if !output.status.success() {
            return Err(ToolError::ExitStatus {
                script: script.to_string(),
                code: result.exit_code,
            });
        }

        Ok(HelperRun { result, workspace })
    }
}
