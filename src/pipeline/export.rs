//! Artifact export to the host filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::engine::Session;
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::image::AssembledImage;
use crate::program::ProgramSpec;
use crate::util::shell::{Shell, Status};

/// A produced artifact, identified by its host path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Binary,
    Image,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Binary => "binary",
            ArtifactKind::Image => "image",
        }
    }
}

/// Export every artifact: the three binaries, then the image archive.
///
/// Each artifact is written exactly once, overwriting any file left by a
/// previous run. A written artifact is verified to be non-empty before
/// the export is considered done.
pub fn export_all(
    session: &Session,
    image: &AssembledImage,
    spec: &ProgramSpec,
    output_dir: &Path,
    shell: &Arc<Shell>,
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(4);

    for target in spec.targets() {
        let dest = output_dir.join(&target.export_path);
        debug!(platform = %target.platform, dest = %dest.display(), "exporting binary");
        session
            .copy_out(&target.output, &dest)
            .with_context(|| format!("failed to export {} binary", target.platform))?;
        ensure_non_empty(&dest)?;

        let artifact = Artifact {
            path: dest,
            kind: ArtifactKind::Binary,
        };
        report(shell, &artifact);
        artifacts.push(artifact);
    }

    let tar = output_dir.join(spec.image_tar());
    debug!(dest = %tar.display(), "exporting image archive");
    session.cancel_token().check()?;
    session
        .engine()
        .save_image(&image.id, &tar)
        .context("failed to export image archive")?;
    ensure_non_empty(&tar)?;

    let artifact = Artifact {
        path: tar,
        kind: ArtifactKind::Image,
    };
    report(shell, &artifact);
    artifacts.push(artifact);

    Ok(artifacts)
}

fn report(shell: &Arc<Shell>, artifact: &Artifact) {
    shell.status(Status::Exported, artifact.path.display());
    PipelineEvent::ArtifactExported {
        path: artifact.path.clone(),
        kind: artifact.kind.as_str().to_string(),
    }
    .emit(shell);
}

fn ensure_non_empty(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("exported artifact `{}` is missing", path.display()))?;
    if metadata.len() == 0 {
        bail!("exported artifact `{}` is empty", path.display());
    }
    Ok(())
}
