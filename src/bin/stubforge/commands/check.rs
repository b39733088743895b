//! `stubforge check` command
//!
//! Runs the whole pipeline without writing anything.

use anyhow::{Context, Result};

use crate::cli::CheckArgs;
use stubforge::ops::generate::bind;
use stubforge::util::diagnostic::Severity;

use super::{exit_if_denied, input_base, load_project_config, report, require_bir};

pub fn execute(args: CheckArgs, color: bool) -> Result<()> {
    let config = load_project_config()?;
    let deny_warnings = args.input.deny_warnings || config.diagnostics.deny_warnings;

    let binding = bind(&input_base(), &args.input.inputs, &config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&binding.diagnostics)
            .context("failed to serialize diagnostics")?;
        println!("{}", json);
    } else {
        report(&binding, color);
    }
    require_bir(&binding)?;

    if !args.json {
        eprintln!(
            "Checked {} headers: {} errors, {} warnings",
            binding.headers.len(),
            binding.diagnostics.count(Severity::Error),
            binding.diagnostics.count(Severity::Warning)
        );
    }

    exit_if_denied(&binding, deny_warnings);
    Ok(())
}
