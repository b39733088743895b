//! `stubforge dump` command

use anyhow::{Context, Result};

use crate::cli::DumpArgs;
use stubforge::ops::generate::bind;
use stubforge::BirDocument;

use super::{exit_if_denied, input_base, load_project_config, report, require_bir};

pub fn execute(args: DumpArgs, color: bool) -> Result<()> {
    let config = load_project_config()?;
    let deny_warnings = args.input.deny_warnings || config.diagnostics.deny_warnings;

    let binding = bind(&input_base(), &args.input.inputs, &config)?;
    report(&binding, color);
    require_bir(&binding)?;

    if let Some(bir) = &binding.bir {
        let json = BirDocument::to_json(bir).context("failed to serialize BIR")?;
        println!("{}", json);
    }

    exit_if_denied(&binding, deny_warnings);
    Ok(())
}
