//! Docker-compatible engine implementation.
//!
//! Drives the engine CLI (`docker` or `podman`; their argument surfaces
//! are compatible for every subcommand used here) through
//! [`ProcessBuilder`]. Every operation is a blocking subprocess call
//! whose failure carries the full command line and captured stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::Engine;
use crate::util::process::ProcessBuilder;

/// A container engine reachable through a docker-compatible CLI.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    binary: PathBuf,
    name: String,
}

impl DockerEngine {
    /// Create an engine for the given CLI binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        let name = binary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "docker".to_string());
        DockerEngine { binary, name }
    }

    fn cmd(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.binary)
    }

    fn run(&self, pb: &ProcessBuilder) -> Result<String> {
        debug!(command = %pb.display_command(), "engine call");
        let output = pb.exec_and_check()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Engine for DockerEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_container(&self, image: &str) -> Result<String> {
        let pb = self
            .cmd()
            .args(["run", "-d", image, "sleep", "infinity"]);
        let id = self
            .run(&pb)
            .with_context(|| format!("failed to start build container from `{}`", image))?;
        if id.is_empty() {
            bail!("engine reported no container id for `{}`", image);
        }
        Ok(id)
    }

    fn create_container(&self, image: &str, command: &[String]) -> Result<String> {
        let pb = self.cmd().arg("create").arg(image).args(command);
        let id = self
            .run(&pb)
            .with_context(|| format!("failed to create container from `{}`", image))?;
        if id.is_empty() {
            bail!("engine reported no container id for `{}`", image);
        }
        Ok(id)
    }

    fn exec(&self, container: &str, workdir: Option<&str>, argv: &[String]) -> Result<String> {
        let mut pb = self.cmd().arg("exec");
        if let Some(dir) = workdir {
            pb = pb.arg("-w").arg(dir);
        }
        let pb = pb.arg(container).args(argv);
        self.run(&pb)
    }

    fn copy_into(&self, container: &str, host_src: &Path, dest: &str) -> Result<()> {
        let pb = self
            .cmd()
            .arg("cp")
            .arg(host_src)
            .arg(format!("{}:{}", container, dest));
        self.run(&pb).with_context(|| {
            format!("failed to copy `{}` into container", host_src.display())
        })?;
        Ok(())
    }

    fn copy_out(&self, container: &str, src: &str, host_dest: &Path) -> Result<()> {
        let pb = self
            .cmd()
            .arg("cp")
            .arg(format!("{}:{}", container, src))
            .arg(host_dest);
        self.run(&pb)
            .with_context(|| format!("failed to copy `{}` out of container", src))?;
        Ok(())
    }

    fn commit(&self, container: &str, changes: &[String]) -> Result<String> {
        let mut pb = self.cmd().arg("commit");
        for change in changes {
            pb = pb.arg("--change").arg(change);
        }
        let pb = pb.arg(container);
        let id = self.run(&pb).context("failed to commit runtime image")?;
        if id.is_empty() {
            bail!("engine reported no image id for committed container");
        }
        Ok(id)
    }

    fn save_image(&self, image: &str, tar: &Path) -> Result<()> {
        let pb = self.cmd().args(["save", "-o"]).arg(tar).arg(image);
        self.run(&pb)
            .with_context(|| format!("failed to save image to `{}`", tar.display()))?;
        Ok(())
    }

    fn load_image(&self, tar: &Path) -> Result<Option<String>> {
        let pb = self.cmd().args(["load", "-i"]).arg(tar);
        let stdout = self
            .run(&pb)
            .with_context(|| format!("failed to load image from `{}`", tar.display()))?;
        Ok(parse_load_output(&stdout))
    }

    fn latest_image_id(&self) -> Result<String> {
        let pb = self.cmd().args(["images", "-q"]);
        let stdout = self.run(&pb).context("failed to list images")?;
        let first = stdout.lines().next().unwrap_or("").trim();
        if first.is_empty() {
            bail!("image listing is empty");
        }
        Ok(first.to_string())
    }

    fn tag_image(&self, image: &str, tag: &str) -> Result<()> {
        let pb = self.cmd().arg("tag").arg(image).arg(tag);
        self.run(&pb)
            .with_context(|| format!("failed to tag image as `{}`", tag))?;
        Ok(())
    }

    fn remove_container(&self, container: &str) -> Result<()> {
        let pb = self.cmd().args(["rm", "-f"]).arg(container);
        self.run(&pb)
            .with_context(|| format!("failed to remove container `{}`", container))?;
        Ok(())
    }
}

/// Extract the image identifier from `load` output.
///
/// Docker and podman report `Loaded image: <name>` or
/// `Loaded image ID: sha256:<digest>` on success.
fn parse_load_output(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Loaded image ID:") {
            return Some(rest.trim().to_string());
        }
        if let Some(rest) = line.strip_prefix("Loaded image:") {
            return Some(rest.trim().to_string());
        }
    }
    None
}
