//! Build session lifecycle and cancellation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use super::Engine;

/// Cooperative cancellation token.
///
/// Cancellation is checked before every blocking remote call; a cancelled
/// token surfaces as an error from the next call, which aborts the
/// pipeline through the normal failure path.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Error out if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            bail!("operation cancelled");
        }
        Ok(())
    }
}

/// An exclusively-owned handle to one running build container.
///
/// The container is started on construction and force-removed on drop,
/// so it is released on every exit path regardless of outcome.
pub struct Session {
    engine: Arc<dyn Engine>,
    container: String,
    cancel: CancelToken,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine.name())
            .field("container", &self.container)
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Session {
    /// Start a build container from `image`.
    pub fn start(engine: Arc<dyn Engine>, image: &str, cancel: CancelToken) -> Result<Session> {
        cancel.check()?;
        let container = engine.start_container(image)?;
        debug!(container = %container, image = %image, "session started");
        Ok(Session {
            engine,
            container,
            cancel,
        })
    }

    /// The container identifier.
    pub fn id(&self) -> &str {
        &self.container
    }

    /// The engine backing this session.
    pub fn engine(&self) -> &dyn Engine {
        &*self.engine
    }

    /// The session's cancellation token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run a command in the container.
    pub fn exec(&self, argv: &[String]) -> Result<String> {
        self.cancel.check()?;
        self.engine.exec(&self.container, None, argv)
    }

    /// Run a command in the container with a working directory.
    pub fn exec_in(&self, workdir: &str, argv: &[String]) -> Result<String> {
        self.cancel.check()?;
        self.engine.exec(&self.container, Some(workdir), argv)
    }

    /// Copy a host file or directory into the container.
    pub fn copy_into(&self, host_src: &Path, dest: &str) -> Result<()> {
        self.cancel.check()?;
        self.engine.copy_into(&self.container, host_src, dest)
    }

    /// Copy a file out of the container.
    pub fn copy_out(&self, src: &str, host_dest: &Path) -> Result<()> {
        self.cancel.check()?;
        self.engine.copy_out(&self.container, src, host_dest)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort release; failure to remove must not mask the
        // pipeline's own error.
        if let Err(e) = self.engine.remove_container(&self.container) {
            debug!(container = %self.container, error = %e, "failed to remove build container");
        }
    }
}
