//! Shared utilities: subprocess execution and shell output.

pub mod process;
pub mod shell;

pub use process::{find_container_engine, find_executable, ProcessBuilder};
pub use shell::{ColorChoice, Shell, ShellMode, Status, Verbosity};
