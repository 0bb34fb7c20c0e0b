//! The staged build pipeline.
//!
//! Control flows strictly top to bottom through named stages, each taking
//! the previous stage's typed output:
//!
//! `Start -> Provisioned -> SourceBound -> Compiled(mac|win|linux)
//!  -> ImageAssembled -> Exported -> Tagged -> Done`
//!
//! Any stage failure aborts the remaining stages and surfaces as a
//! [`PipelineError`] classified by stage. Already-exported artifacts are
//! never rolled back.

pub mod compile;
pub mod error;
pub mod events;
pub mod export;
pub mod image;
pub mod provision;
pub mod source;
pub mod tag;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::engine::{CancelToken, Engine, Session};
use crate::program::{Platform, ProgramSpec};
use crate::util::shell::{Shell, Status};

pub use error::PipelineError;
pub use events::PipelineEvent;
pub use export::{Artifact, ArtifactKind};
pub use image::AssembledImage;

/// A pipeline stage, for logging and error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Provisioned,
    SourceBound,
    Compiled(Platform),
    ImageAssembled,
    Exported,
    Tagged,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Provisioned => write!(f, "provision"),
            Stage::SourceBound => write!(f, "bind-source"),
            Stage::Compiled(platform) => write!(f, "compile:{}", platform),
            Stage::ImageAssembled => write!(f, "assemble-image"),
            Stage::Exported => write!(f, "export"),
            Stage::Tagged => write!(f, "tag"),
        }
    }
}

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Host directory bound into the build container.
    pub source_dir: PathBuf,
    /// Host directory artifacts are exported to.
    pub output_dir: PathBuf,
    /// Compile the three targets concurrently.
    pub parallel: bool,
    /// External cancellation signal, checked before every blocking
    /// remote call.
    pub cancel: CancelToken,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            parallel: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug)]
pub struct PipelineSummary {
    pub artifacts: Vec<Artifact>,
    pub image_tag: String,
    pub duration: Duration,
}

/// The whole workflow for one program.
pub struct Pipeline {
    engine: Arc<dyn Engine>,
    spec: ProgramSpec,
    shell: Arc<Shell>,
    opts: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn Engine>,
        spec: ProgramSpec,
        shell: Arc<Shell>,
        opts: PipelineOptions,
    ) -> Self {
        Pipeline {
            engine,
            spec,
            shell,
            opts,
        }
    }

    /// Run every stage in order. The build container is released on
    /// every exit path, and a terminal `pipeline-finished` event is
    /// emitted whether the run succeeded or not.
    pub fn run(&self) -> Result<PipelineSummary, PipelineError> {
        let start = Instant::now();
        let result = self.run_stages(start);

        let (success, artifacts) = match &result {
            Ok(summary) => (true, summary.artifacts.len() as u64),
            // Tagging fails only after the full artifact set was written.
            Err(err) if err.artifacts_exported() => {
                (false, self.spec.targets().len() as u64 + 1)
            }
            Err(_) => (false, 0),
        };
        PipelineEvent::PipelineFinished {
            success,
            duration_ms: start.elapsed().as_millis() as u64,
            artifacts,
        }
        .emit(&self.shell);

        result
    }

    fn run_stages(&self, start: Instant) -> Result<PipelineSummary, PipelineError> {
        let spec = &self.spec;

        self.stage_started(Stage::Provisioned);
        self.shell.status(Status::Provisioning, &spec.base_image);
        let session = Session::start(
            Arc::clone(&self.engine),
            &spec.base_image,
            self.opts.cancel.clone(),
        )
        .map_err(PipelineError::Provisioning)?;
        provision::install_toolchain(&session).map_err(PipelineError::Provisioning)?;

        self.stage_started(Stage::SourceBound);
        self.shell
            .status(Status::Binding, self.opts.source_dir.display());
        source::bind(&session, &self.opts.source_dir).map_err(PipelineError::Provisioning)?;

        compile::compile_all(&session, spec, self.opts.parallel, &self.shell)?;

        self.stage_started(Stage::ImageAssembled);
        self.shell.status(Status::Assembling, &spec.runtime_image);
        let assembled = image::assemble(&session, spec).map_err(PipelineError::Assembly)?;

        self.stage_started(Stage::Exported);
        self.shell
            .status(Status::Exporting, self.opts.output_dir.display());
        let artifacts = export::export_all(
            &session,
            &assembled,
            spec,
            &self.opts.output_dir,
            &self.shell,
        )
        .map_err(PipelineError::Export)?;

        self.stage_started(Stage::Tagged);
        self.shell.status(Status::Tagging, spec.image_tag());
        let tar = self.opts.output_dir.join(spec.image_tar());
        let image_tag = tag::load_and_tag(&*self.engine, &self.opts.cancel, spec, &tar)
            .map_err(PipelineError::Tagging)?;
        self.shell.status(Status::Tagged, &image_tag);

        let duration = start.elapsed();
        Ok(PipelineSummary {
            artifacts,
            image_tag,
            duration,
        })
    }

    fn stage_started(&self, stage: Stage) {
        info!(stage = %stage, "stage started");
        PipelineEvent::StageStarted {
            stage: stage.to_string(),
        }
        .emit(&self.shell);
    }
}
