//! Load the exported image archive and assign its human-readable tag.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::engine::{CancelToken, Engine};
use crate::program::ProgramSpec;

/// Load the image archive into the local registry and tag it.
///
/// Identity resolution prefers the identifier the engine itself reports
/// for the load operation. Only when the engine reports nothing do we
/// fall back to the newest entry of the image listing; that query is
/// racy (another process creating an image between load and query wins
/// the listing head) and is kept solely for engines with silent load
/// output.
pub fn load_and_tag(
    engine: &dyn Engine,
    cancel: &CancelToken,
    spec: &ProgramSpec,
    tar: &Path,
) -> Result<String> {
    cancel.check()?;
    let loaded = engine
        .load_image(tar)
        .with_context(|| format!("failed to load `{}`", tar.display()))?;

    let image = match loaded {
        Some(id) => id,
        None => {
            warn!("engine did not report a loaded image id; falling back to listing order");
            cancel.check()?;
            engine
                .latest_image_id()
                .context("failed to identify loaded image")?
        }
    };

    let tag = spec.image_tag();
    debug!(image = %image, tag = %tag, "tagging image");
    cancel.check()?;
    engine
        .tag_image(&image, &tag)
        .with_context(|| format!("failed to tag `{}`", image))?;

    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockEngine;

    #[test]
    fn test_tag_uses_load_reported_id() {
        let engine = MockEngine::new();
        let spec = ProgramSpec::default_spec();

        let tag = load_and_tag(
            &engine,
            &CancelToken::new(),
            &spec,
            Path::new("dagger-excuse-deno.tar"),
        )
        .unwrap();

        assert_eq!(tag, "excuse:latest");
        let log = engine.call_log();
        assert!(log.iter().any(|c| c == "tag sha256:mockimage excuse:latest"));
        // No listing query when load reports an id.
        assert!(!log.iter().any(|c| c == "images"));
    }

    #[test]
    fn test_tag_falls_back_to_listing() {
        let engine = MockEngine::new();
        engine.set_load_reports_id(false);
        let spec = ProgramSpec::default_spec();

        load_and_tag(
            &engine,
            &CancelToken::new(),
            &spec,
            Path::new("dagger-excuse-deno.tar"),
        )
        .unwrap();

        let log = engine.call_log();
        assert!(log.iter().any(|c| c == "images"));
        assert!(log
            .iter()
            .any(|c| c == "tag sha256:listing-head excuse:latest"));
    }

    #[test]
    fn test_load_failure_propagates() {
        let engine = MockEngine::new();
        engine.fail_when_contains("load", "archive corrupt");
        let spec = ProgramSpec::default_spec();

        let err = load_and_tag(
            &engine,
            &CancelToken::new(),
            &spec,
            Path::new("dagger-excuse-deno.tar"),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("archive corrupt"));
    }
}
