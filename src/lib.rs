//! Slipway - a containerized cross-compilation pipeline for Deno programs.
//!
//! This crate provisions a build container, installs the Deno toolchain,
//! binds the host source tree, compiles a single entry-point source for
//! macOS, Windows and Linux, packages a minimal runtime image around the
//! Linux binary, exports every artifact to the host filesystem, and tags
//! the image in the local registry.

pub mod engine;
pub mod pipeline;
pub mod program;
pub mod util;
pub mod verify;

/// Test utilities and mocks for slipway unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scriptable mock container engine.
#[cfg(test)]
pub mod test_support;

pub use engine::{detect_engine, CancelToken, DockerEngine, Engine, Session};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineSummary, Stage};
pub use program::{BuildTarget, Platform, ProgramSpec};
