//! Minimal runtime image assembly.

use anyhow::{Context, Result};
use tracing::debug;

use crate::engine::{Engine, Session};
use crate::program::{Platform, ProgramSpec, BIND_DIR};

/// An assembled runtime image, identified by the engine's image id.
#[derive(Debug, Clone)]
pub struct AssembledImage {
    pub id: String,
}

/// Assemble the minimal runtime image.
///
/// The image contains only the Linux binary, with working directory and
/// entrypoint set to it. The Linux compilation leg must have succeeded
/// before this runs. The runtime base cannot run a shell, so the binary
/// is staged through the host and the container is committed stopped.
pub fn assemble(session: &Session, spec: &ProgramSpec) -> Result<AssembledImage> {
    let engine = session.engine();
    let cancel = session.cancel_token();
    let linux = spec.target(Platform::Linux);

    // Stage the Linux binary in a host directory laid out exactly as the
    // image's /app should look.
    let staging = tempfile::tempdir().context("failed to create staging directory")?;
    let staged = staging.path().join(&spec.name);
    session
        .copy_out(&linux.output, &staged)
        .context("failed to stage Linux binary")?;

    cancel.check()?;
    let container = engine.create_container(&spec.runtime_image, &[spec.image_binary_path()])?;
    debug!(container = %container, base = %spec.runtime_image, "assembling runtime image");

    let result = populate_and_commit(engine, cancel, &container, staging.path(), spec);

    // The assembly container is transient either way.
    if let Err(e) = engine.remove_container(&container) {
        debug!(container = %container, error = %e, "failed to remove assembly container");
    }

    result
}

fn populate_and_commit(
    engine: &dyn Engine,
    cancel: &crate::engine::CancelToken,
    container: &str,
    staging: &std::path::Path,
    spec: &ProgramSpec,
) -> Result<AssembledImage> {
    cancel.check()?;
    // `dir/.` copies the directory's contents; passing the directory
    // itself would nest it under an existing bind dir.
    engine
        .copy_into(container, &staging.join("."), BIND_DIR)
        .context("failed to copy binary into runtime image")?;

    cancel.check()?;
    let changes = vec![
        format!("WORKDIR {}", BIND_DIR),
        format!("ENTRYPOINT [\"{}\"]", spec.image_binary_path()),
    ];
    let id = engine.commit(container, &changes)?;

    Ok(AssembledImage { id })
}
