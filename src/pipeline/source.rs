//! Source binding: attach the host source tree to the build container.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::engine::Session;
use crate::program::BIND_DIR;

/// Copy the host directory into the container at [`BIND_DIR`].
///
/// All subsequent compilation steps operate against the bound tree.
pub fn bind(session: &Session, host_dir: &Path) -> Result<()> {
    if !host_dir.is_dir() {
        bail!("source directory `{}` does not exist", host_dir.display());
    }

    debug!(dir = %host_dir.display(), "binding source tree");
    session
        .exec(&["mkdir".to_string(), "-p".to_string(), BIND_DIR.to_string()])
        .context("failed to create bind directory")?;

    // `dir/.` copies the directory's contents rather than the directory.
    let contents = host_dir.join(".");
    session
        .copy_into(&contents, BIND_DIR)
        .with_context(|| format!("failed to bind `{}`", host_dir.display()))?;

    Ok(())
}
