//! Command implementations

pub mod check;
pub mod completions;
pub mod dump;
pub mod generate;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use stubforge::ops::generate::Binding;
use stubforge::util::config::{global_config_path, load_config, project_config_path};
use stubforge::util::diagnostic::{emit, Severity};
use stubforge::util::Config;

/// Exit status when diagnostics are denied.
const DENIED_EXIT_CODE: i32 = 2;

pub fn use_color(no_color: bool) -> bool {
    !no_color && std::io::stderr().is_terminal()
}

/// Load configuration (global + project) for the current directory.
pub fn load_project_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let global = global_config_path();
    Ok(load_config(global.as_deref(), &project_config_path(&cwd)))
}

/// Inputs are resolved against the current directory.
pub fn input_base() -> PathBuf {
    PathBuf::new()
}

/// Print every diagnostic to stderr.
pub fn report(binding: &Binding, color: bool) {
    for diagnostic in &binding.diagnostics {
        emit(diagnostic, color);
    }
}

/// Fail when the pipeline produced no BIR.
pub fn require_bir(binding: &Binding) -> Result<()> {
    if binding.bir.is_none() {
        let fatal = binding.diagnostics.count(Severity::Fatal);
        bail!(
            "no BIR produced from {} headers ({} fatal diagnostic{})",
            binding.headers.len(),
            fatal,
            if fatal == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Exit with status 2 when warnings are denied and any were reported.
pub fn exit_if_denied(binding: &Binding, deny_warnings: bool) {
    if deny_warnings && binding.diagnostics.has_at_least(Severity::Warning) {
        eprintln!(
            "error: {} diagnostics reported and warnings are denied",
            binding.diagnostics.len()
        );
        std::process::exit(DENIED_EXIT_CODE);
    }
}
