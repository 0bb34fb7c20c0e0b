//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use slipway::util::shell::ColorChoice;

/// Slipway - containerized cross-compilation pipeline for Deno programs
///
/// With no arguments, builds the default program end to end: provision a
/// build container, compile for macOS, Windows and Linux, assemble a
/// minimal runtime image, export all artifacts, and tag the image.
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Built-in program to build
    #[arg(long, default_value = "excuse")]
    pub program: String,

    /// Host directory bound into the build container
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Container engine binary (default: autodetect docker, then podman)
    #[arg(long, env = "SLIPWAY_ENGINE")]
    pub engine: Option<String>,

    /// Compile the three targets concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Verify existing artifacts instead of building
    #[arg(long)]
    pub check: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Output format: human, json
    #[arg(long = "message-format", value_parser = ["human", "json"], default_value = "human")]
    pub message_format: String,
}
