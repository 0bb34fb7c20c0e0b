//! Program specifications and build targets.
//!
//! A [`ProgramSpec`] parameterizes the whole pipeline: the entry-point
//! source, the network hosts the compiled program may reach, and the base
//! images for the build and runtime containers. Two near-identical
//! pipelines collapse into one workflow driven by these values.

use std::fmt;
use std::path::PathBuf;

/// A target platform for cross-compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// All platforms, in the order the pipeline compiles them.
    pub const ALL: [Platform; 3] = [Platform::MacOs, Platform::Windows, Platform::Linux];

    /// The `--target` triple passed to the compiler.
    ///
    /// Linux is the native target inside the build container, so no
    /// triple is passed for it.
    pub fn target_triple(&self) -> Option<&'static str> {
        match self {
            Platform::MacOs => Some("x86_64-apple-darwin"),
            Platform::Windows => Some("x86_64-pc-windows-msvc"),
            Platform::Linux => None,
        }
    }

    /// Suffix appended to the exported binary name.
    pub fn export_suffix(&self) -> &'static str {
        match self {
            Platform::MacOs => "-mac",
            Platform::Windows => "-win.exe",
            Platform::Linux => "-linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        };
        write!(f, "{}", name)
    }
}

/// One leg of the cross-compilation: platform, in-container output path,
/// and the host path the binary is exported to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub platform: Platform,
    /// Output path inside the build container. Distinct per target so the
    /// three legs never clobber each other.
    pub output: String,
    /// Host path the binary is exported to.
    pub export_path: PathBuf,
}

/// Parameters for one program's pipeline.
#[derive(Debug, Clone)]
pub struct ProgramSpec {
    /// Artifact name; also the stem of every export path.
    pub name: String,
    /// Entry-point source file, relative to the bound directory.
    pub source: String,
    /// Network hosts the compiled program is allowed to reach
    /// (`--allow-net` allow-list). Empty means no network permission.
    pub allowed_hosts: Vec<String>,
    /// Base image for the build container.
    pub base_image: String,
    /// Base image for the minimal runtime image.
    pub runtime_image: String,
}

/// In-container directory the host source tree is bound to.
pub const BIND_DIR: &str = "/app";

impl ProgramSpec {
    /// The built-in program specs, selectable by name from the CLI.
    pub fn builtin() -> Vec<ProgramSpec> {
        vec![ProgramSpec {
            name: "excuse".to_string(),
            source: "excuse.ts".to_string(),
            allowed_hosts: vec!["developerexcuses.com".to_string()],
            base_image: "ubuntu:22.04".to_string(),
            runtime_image: "gcr.io/distroless/cc-debian12".to_string(),
        }]
    }

    /// Look up a built-in spec by name.
    pub fn find_builtin(name: &str) -> Option<ProgramSpec> {
        Self::builtin().into_iter().find(|p| p.name == name)
    }

    /// The default program.
    pub fn default_spec() -> ProgramSpec {
        Self::builtin()
            .into_iter()
            .next()
            .unwrap_or_else(|| unreachable!("builtin spec table is non-empty"))
    }

    /// The three fixed build targets for this program.
    pub fn targets(&self) -> Vec<BuildTarget> {
        Platform::ALL
            .iter()
            .map(|&platform| BuildTarget {
                platform,
                output: format!("{}/{}{}", BIND_DIR, self.name, platform.export_suffix()),
                export_path: PathBuf::from(format!("{}{}", self.name, platform.export_suffix())),
            })
            .collect()
    }

    /// The build target for a specific platform.
    pub fn target(&self, platform: Platform) -> BuildTarget {
        self.targets()
            .into_iter()
            .find(|t| t.platform == platform)
            .unwrap_or_else(|| unreachable!("targets() covers every platform"))
    }

    /// In-image path of the program binary.
    pub fn image_binary_path(&self) -> String {
        format!("{}/{}", BIND_DIR, self.name)
    }

    /// Host path the runtime image archive is exported to.
    pub fn image_tar(&self) -> PathBuf {
        PathBuf::from(format!("dagger-{}-deno.tar", self.name))
    }

    /// Tag assigned to the loaded runtime image.
    pub fn image_tag(&self) -> String {
        format!("{}:latest", self.name)
    }

    /// The `--allow-net` argument, or None if no hosts are allowed.
    pub fn allow_net_arg(&self) -> Option<String> {
        if self.allowed_hosts.is_empty() {
            None
        } else {
            Some(format!("--allow-net={}", self.allowed_hosts.join(",")))
        }
    }
}
