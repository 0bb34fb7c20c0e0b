//! Test utilities and mocks for slipway unit tests.
//!
//! Provides a scriptable mock container engine so the pipeline's state
//! machine can be exercised without a real engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use slipway::test_support::MockEngine;
//!
//! #[test]
//! fn test_example() {
//!     let engine = MockEngine::new();
//!     engine.fail_when_contains("apt-get update", "mirror unreachable");
//!
//!     // Run pipeline stages against the mock...
//!     assert!(engine.call_log().iter().any(|c| c.starts_with("exec ")));
//! }
//! ```

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::engine::Engine;
use crate::util::shell::{ColorChoice, Shell};

/// A quiet shell for tests.
pub fn quiet_shell() -> Arc<Shell> {
    Arc::new(Shell::from_flags(true, false, ColorChoice::Never, false))
}

/// Scriptable mock container engine.
///
/// Every call is rendered to a log line; scripted failures match on a
/// substring of that line. Operations that write host files (copy_out,
/// save_image) write real placeholder content so export semantics can be
/// asserted against the filesystem.
#[derive(Debug, Default)]
pub struct MockEngine {
    calls: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, String)>>,
    containers: AtomicUsize,
    load_reports_id: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            containers: AtomicUsize::new(0),
            load_reports_id: AtomicBool::new(true),
        }
    }

    /// Script a failure: any call whose log line contains `needle` fails
    /// with `message`.
    pub fn fail_when_contains(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap()
            .push((needle.into(), message.into()));
    }

    /// Whether `load_image` reports an identifier (default) or returns
    /// None, forcing callers onto the listing fallback.
    pub fn set_load_reports_id(&self, reports: bool) {
        self.load_reports_id.store(reports, Ordering::SeqCst);
    }

    /// All calls made so far, in order.
    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, line: String) -> Result<()> {
        self.calls.lock().unwrap().push(line.clone());
        for (needle, message) in self.failures.lock().unwrap().iter() {
            if line.contains(needle.as_str()) {
                return Err(anyhow!("{}", message));
            }
        }
        Ok(())
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn start_container(&self, image: &str) -> Result<String> {
        self.record(format!("start {}", image))?;
        let n = self.containers.fetch_add(1, Ordering::SeqCst);
        Ok(format!("mock-ctr-{}", n))
    }

    fn create_container(&self, image: &str, command: &[String]) -> Result<String> {
        self.record(format!("create {} {}", image, command.join(" ")))?;
        let n = self.containers.fetch_add(1, Ordering::SeqCst);
        Ok(format!("mock-ctr-{}", n))
    }

    fn exec(&self, container: &str, workdir: Option<&str>, argv: &[String]) -> Result<String> {
        self.record(format!(
            "exec [{}] {} {}",
            workdir.unwrap_or("-"),
            container,
            argv.join(" ")
        ))?;
        Ok(String::new())
    }

    fn copy_into(&self, container: &str, host_src: &Path, dest: &str) -> Result<()> {
        self.record(format!(
            "copy_into {} {}:{}",
            host_src.display(),
            container,
            dest
        ))
    }

    fn copy_out(&self, container: &str, src: &str, host_dest: &Path) -> Result<()> {
        self.record(format!(
            "copy_out {}:{} {}",
            container,
            src,
            host_dest.display()
        ))?;
        std::fs::write(host_dest, b"mock-binary")
            .map_err(|e| anyhow!("failed to write `{}`: {}", host_dest.display(), e))?;
        Ok(())
    }

    fn commit(&self, container: &str, changes: &[String]) -> Result<String> {
        self.record(format!("commit {} {}", changes.join(" "), container))?;
        Ok("sha256:mockimage".to_string())
    }

    fn save_image(&self, image: &str, tar: &Path) -> Result<()> {
        self.record(format!("save {} {}", image, tar.display()))?;
        // Write a minimal but structurally valid image archive.
        let file = File::create(tar)
            .map_err(|e| anyhow!("failed to create `{}`: {}", tar.display(), e))?;
        let mut builder = tar::Builder::new(file);
        let data = b"[]";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "manifest.json", &data[..])?;
        builder.finish()?;
        Ok(())
    }

    fn load_image(&self, tar: &Path) -> Result<Option<String>> {
        self.record(format!("load {}", tar.display()))?;
        if self.load_reports_id.load(Ordering::SeqCst) {
            Ok(Some("sha256:mockimage".to_string()))
        } else {
            Ok(None)
        }
    }

    fn latest_image_id(&self) -> Result<String> {
        self.record("images".to_string())?;
        Ok("sha256:listing-head".to_string())
    }

    fn tag_image(&self, image: &str, tag: &str) -> Result<()> {
        self.record(format!("tag {} {}", image, tag))
    }

    fn remove_container(&self, container: &str) -> Result<()> {
        self.record(format!("rm {}", container))
    }
}
