//! Post-run artifact verification.
//!
//! Checks that a prior pipeline run left a complete artifact set on the
//! host: every binary exists and is non-empty, and the image archive is
//! a readable tar containing an image manifest.

use std::fs;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tar::Archive;

use crate::program::ProgramSpec;

/// Verify the full artifact set for `spec` under `dir`.
pub fn check_artifacts(spec: &ProgramSpec, dir: &Path) -> Result<()> {
    for target in spec.targets() {
        let path = dir.join(&target.export_path);
        let metadata = fs::metadata(&path)
            .with_context(|| format!("binary `{}` is missing", path.display()))?;
        if metadata.len() == 0 {
            bail!("binary `{}` is empty", path.display());
        }
    }

    let tar_path = dir.join(spec.image_tar());
    check_image_archive(&tar_path)?;

    Ok(())
}

/// Verify that the image archive parses as a tar and carries a manifest.
pub fn check_image_archive(path: &Path) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("image archive `{}` is missing", path.display()))?;

    let mut archive = Archive::new(file);
    let entries = archive
        .entries()
        .with_context(|| format!("image archive `{}` is not a tar", path.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("image archive `{}` is corrupt", path.display()))?;
        let entry_path = entry.path()?;
        if entry_path
            .file_name()
            .is_some_and(|n| n == "manifest.json")
        {
            return Ok(());
        }
    }

    bail!(
        "image archive `{}` has no manifest.json entry",
        path.display()
    );
}
