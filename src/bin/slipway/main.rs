//! Slipway CLI - containerized cross-compilation pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use slipway::engine::{detect_engine, CancelToken, DockerEngine, Engine};
use slipway::pipeline::{Pipeline, PipelineOptions};
use slipway::program::ProgramSpec;
use slipway::util::process::find_executable;
use slipway::util::shell::{Shell, Status};
use slipway::verify;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == "json",
    ));

    let spec = ProgramSpec::find_builtin(&cli.program).ok_or_else(|| {
        let known: Vec<String> = ProgramSpec::builtin().into_iter().map(|p| p.name).collect();
        anyhow!(
            "unknown program `{}`; built-in programs: {}",
            cli.program,
            known.join(", ")
        )
    })?;

    if cli.check {
        shell.status(Status::Checking, format!("artifacts for `{}`", spec.name));
        verify::check_artifacts(&spec, Path::new("."))?;
        shell.status(Status::Finished, "all artifacts present");
        return Ok(());
    }

    let engine: Arc<dyn Engine> = match cli.engine {
        Some(ref name) => {
            let binary = find_executable(name)
                .ok_or_else(|| anyhow!("container engine `{}` not found in PATH", name))?;
            Arc::new(DockerEngine::new(binary))
        }
        None => Arc::new(detect_engine()?),
    };

    let opts = PipelineOptions {
        source_dir: cli.source_dir,
        output_dir: ".".into(),
        parallel: cli.parallel,
        cancel: CancelToken::new(),
    };

    let pipeline = Pipeline::new(engine, spec.clone(), Arc::clone(&shell), opts);
    let summary = pipeline.run()?;

    shell.status(
        Status::Finished,
        format!(
            "{} artifacts, image tagged `{}` ({:.2}s)",
            summary.artifacts.len(),
            summary.image_tag,
            summary.duration.as_secs_f64()
        ),
    );
    if !shell.is_json() {
        println!("Container image exported as {}", spec.image_tar().display());
    }

    Ok(())
}
