//! Environment provisioning: package index, packages, toolchain.

use anyhow::{Context, Result};
use tracing::debug;

use crate::engine::Session;

/// URL of the Deno installer script.
const DENO_INSTALL_URL: &str = "https://deno.land/x/install/install.sh";

/// Path the installer drops the binary at.
const DENO_INSTALL_PATH: &str = "/root/.deno/bin/deno";

/// Well-known path the toolchain is relocated to.
const DENO_BIN: &str = "/usr/local/bin/deno";

/// Install the Deno toolchain into the build container.
///
/// Four blocking remote executions, in order: refresh the package index,
/// install download tooling, run the Deno installer, relocate the binary
/// to a well-known path. The first failure aborts with the underlying
/// error unmodified.
pub fn install_toolchain(session: &Session) -> Result<()> {
    debug!("refreshing package index");
    session
        .exec(&argv(&["apt-get", "update"]))
        .context("package index refresh failed")?;

    debug!("installing download tooling");
    session
        .exec(&argv(&["apt-get", "install", "-y", "curl", "unzip"]))
        .context("package installation failed")?;

    debug!("installing deno");
    let installer = vec![
        "sh".to_string(),
        "-c".to_string(),
        format!("curl -fsSL {} | sh", DENO_INSTALL_URL),
    ];
    session.exec(&installer).context("deno installer failed")?;

    debug!("relocating deno binary");
    session
        .exec(&argv(&["mv", DENO_INSTALL_PATH, DENO_BIN]))
        .context("deno binary relocation failed")?;

    Ok(())
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
