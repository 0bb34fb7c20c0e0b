//! Pipeline error taxonomy.

use thiserror::Error;

use crate::pipeline::Stage;
use crate::program::Platform;

/// A pipeline failure, classified by the stage that produced it.
///
/// Every variant wraps the underlying error unmodified; nothing is
/// retried or suppressed. `Tagging` is special: it can only occur after
/// all artifacts were durably exported, so it represents partial success
/// (artifacts present, tag absent) rather than total failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provisioning failed: {0:#}")]
    Provisioning(anyhow::Error),

    #[error("cross-compilation for {target} failed: {error:#}")]
    Compilation {
        target: Platform,
        error: anyhow::Error,
    },

    #[error("image assembly failed: {0:#}")]
    Assembly(anyhow::Error),

    #[error("artifact export failed: {0:#}")]
    Export(anyhow::Error),

    #[error("image tagging failed (artifacts were already exported): {0:#}")]
    Tagging(anyhow::Error),
}

impl PipelineError {
    /// The stage this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Provisioning(_) => Stage::Provisioned,
            PipelineError::Compilation { target, .. } => Stage::Compiled(*target),
            PipelineError::Assembly(_) => Stage::ImageAssembled,
            PipelineError::Export(_) => Stage::Exported,
            PipelineError::Tagging(_) => Stage::Tagged,
        }
    }

    /// Whether all artifacts were already exported when this error
    /// occurred. Distinguishes partial success from total failure.
    pub fn artifacts_exported(&self) -> bool {
        matches!(self, PipelineError::Tagging(_))
    }
}
