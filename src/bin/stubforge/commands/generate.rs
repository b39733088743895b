//! `stubforge generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use stubforge::ops::generate::{generate, GenerateOptions};
use stubforge::util::diagnostic::Severity;

use super::{exit_if_denied, input_base, load_project_config, report, require_bir};

pub fn execute(args: GenerateArgs, color: bool) -> Result<()> {
    let config = load_project_config()?;
    let deny_warnings = args.input.deny_warnings || config.diagnostics.deny_warnings;

    let opts = GenerateOptions {
        inputs: args.input.inputs,
        base: input_base(),
        module: args.module,
        out_dir: args.out_dir,
        no_stub: args.no_stub,
        no_bir: args.no_bir,
    };

    let result = generate(&opts, &config)?;
    report(&result.binding, color);
    require_bir(&result.binding)?;

    let nodes = result.binding.bir.as_ref().map_or(0, |bir| bir.node_count());
    eprintln!(
        "Generated `{}` from {} headers: {} nodes, {} warnings",
        result.module,
        result.binding.headers.len(),
        nodes,
        result.binding.diagnostics.count(Severity::Warning)
    );
    for path in &result.written {
        eprintln!("  {}", path.display());
    }

    exit_if_denied(&result.binding, deny_warnings);
    Ok(())
}
