//! Cross-compilation of the bound source for each target platform.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::engine::Session;
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::{PipelineError, Stage};
use crate::program::{BuildTarget, ProgramSpec, BIND_DIR};
use crate::util::shell::{Shell, Status};

/// Compile one target inside the build container.
///
/// The permission scope is constant per program; the `--target` flag is
/// omitted for the native (Linux) target. Output paths are distinct per
/// target, so the legs are independent of each other.
pub fn compile_target(session: &Session, spec: &ProgramSpec, target: &BuildTarget) -> Result<()> {
    let mut argv: Vec<String> = vec!["deno".to_string(), "compile".to_string()];

    if let Some(allow_net) = spec.allow_net_arg() {
        argv.push(allow_net);
    }

    if let Some(triple) = target.platform.target_triple() {
        argv.push("--target".to_string());
        argv.push(triple.to_string());
    }

    argv.push("--output".to_string());
    argv.push(target.output.clone());
    argv.push(spec.source.clone());

    debug!(platform = %target.platform, output = %target.output, "compiling");
    session.exec_in(BIND_DIR, &argv)?;
    Ok(())
}

/// Compile all three targets.
///
/// Sequential by default, short-circuiting on the first failure. With
/// `parallel`, the legs run concurrently on a scoped worker per target;
/// the reported error is still the first failure in target order, and a
/// partial artifact set is never treated as success.
pub fn compile_all(
    session: &Session,
    spec: &ProgramSpec,
    parallel: bool,
    shell: &Arc<Shell>,
) -> Result<(), PipelineError> {
    let targets = spec.targets();

    if parallel {
        shell.status(
            Status::Compiling,
            format!("{} ({} targets, parallel)", spec.source, targets.len()),
        );
        for target in &targets {
            PipelineEvent::StageStarted {
                stage: Stage::Compiled(target.platform).to_string(),
            }
            .emit(shell);
        }

        let mut results: Vec<Option<Result<()>>> = targets.iter().map(|_| None).collect();
        rayon::scope(|s| {
            for (slot, target) in results.iter_mut().zip(targets.iter()) {
                s.spawn(move |_| {
                    *slot = Some(compile_target(session, spec, target));
                });
            }
        });

        // First failure in target order wins.
        for (result, target) in results.into_iter().zip(targets.iter()) {
            match result {
                Some(Ok(())) => {}
                Some(Err(error)) => {
                    return Err(PipelineError::Compilation {
                        target: target.platform,
                        error,
                    })
                }
                None => unreachable!("every compile slot is filled by its worker"),
            }
        }
    } else {
        let mut progress = shell.progress(targets.len() as u64, "compiling");
        for target in &targets {
            shell.status(
                Status::Compiling,
                format!("{} for {}", spec.source, target.platform),
            );
            PipelineEvent::StageStarted {
                stage: Stage::Compiled(target.platform).to_string(),
            }
            .emit(shell);
            compile_target(session, spec, target).map_err(|error| PipelineError::Compilation {
                target: target.platform,
                error,
            })?;
            progress.inc(1);
        }
        progress.finish();
    }

    Ok(())
}
