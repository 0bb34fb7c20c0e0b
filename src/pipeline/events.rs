//! Pipeline event types for JSON output.
//!
//! These events form the stable machine-readable schema emitted in JSON
//! shell mode, one JSON object per line on stdout.
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or
//! renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::util::shell::Shell;

/// A pipeline event emitted during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum PipelineEvent {
    /// A stage began executing.
    #[serde(rename = "stage-started")]
    StageStarted {
        /// Stage name (e.g. "provision", "compile:windows")
        stage: String,
    },

    /// An artifact was written to the host filesystem.
    #[serde(rename = "artifact-exported")]
    ArtifactExported {
        /// Host path of the artifact
        path: PathBuf,
        /// "binary" or "image"
        kind: String,
    },

    /// The pipeline finished (success or failure).
    #[serde(rename = "pipeline-finished")]
    PipelineFinished {
        /// Whether the run succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of artifacts exported
        artifacts: u64,
    },
}

impl PipelineEvent {
    /// Emit this event through the shell (no-op outside JSON mode).
    pub fn emit(&self, shell: &Shell) {
        if let Ok(value) = serde_json::to_value(self) {
            shell.json_event(&value);
        }
    }
}
