//! Container engine abstraction.
//!
//! The [`Engine`] trait is the seam between the pipeline and the local
//! container engine. The production implementation drives the engine's
//! CLI through [`crate::util::process::ProcessBuilder`]; tests substitute
//! a scripted mock.

pub mod docker;
pub mod session;

use std::path::Path;

use anyhow::{anyhow, Result};

pub use docker::DockerEngine;
pub use session::{CancelToken, Session};

use crate::util::process::find_container_engine;

/// Operations the pipeline needs from a container engine.
///
/// Container identifiers and image identifiers are opaque strings as
/// reported by the engine.
pub trait Engine: Send + Sync {
    /// Engine name for diagnostics (e.g. "docker").
    fn name(&self) -> &str;

    /// Create and start a long-lived container from `image`, returning
    /// its identifier. The container idles until removed.
    fn start_container(&self, image: &str) -> Result<String>;

    /// Create a stopped container from `image` with the given command,
    /// returning its identifier. Used for assembling images from bases
    /// that cannot run a shell.
    fn create_container(&self, image: &str, command: &[String]) -> Result<String>;

    /// Run a command inside a running container, failing on non-zero
    /// exit. Returns captured stdout.
    fn exec(&self, container: &str, workdir: Option<&str>, argv: &[String]) -> Result<String>;

    /// Copy a host file or directory into a container.
    fn copy_into(&self, container: &str, host_src: &Path, dest: &str) -> Result<()>;

    /// Copy a file out of a container to a host path, overwriting any
    /// existing file.
    fn copy_out(&self, container: &str, src: &str, host_dest: &Path) -> Result<()>;

    /// Commit a container to a new image, applying configuration
    /// changes (e.g. `WORKDIR`, `ENTRYPOINT`). Returns the image
    /// identifier.
    fn commit(&self, container: &str, changes: &[String]) -> Result<String>;

    /// Serialize an image to a tar archive on the host.
    fn save_image(&self, image: &str, tar: &Path) -> Result<()>;

    /// Load an image archive into the local registry. Returns the image
    /// identifier reported by the engine's own output, if it reports one.
    fn load_image(&self, tar: &Path) -> Result<Option<String>>;

    /// The most recently created image identifier in the local registry.
    ///
    /// Inherently racy: only identifies a just-loaded image if no other
    /// process created an image in the meantime. Callers should prefer
    /// the identifier reported by [`Engine::load_image`].
    fn latest_image_id(&self) -> Result<String>;

    /// Assign a tag to an image.
    fn tag_image(&self, image: &str, tag: &str) -> Result<()>;

    /// Force-remove a container.
    fn remove_container(&self, container: &str) -> Result<()>;
}

/// Detect the local container engine (`docker`, then `podman`).
pub fn detect_engine() -> Result<DockerEngine> {
    let binary = find_container_engine().ok_or_else(|| {
        anyhow!("no container engine found in PATH (looked for `docker` and `podman`)")
    })?;
    Ok(DockerEngine::new(binary))
}
