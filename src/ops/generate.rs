//! Implementation of `stubforge generate`, `dump` and `check`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::bir::{Bir, BirDocument};
use crate::emit::render_stub;
use crate::ops::pipeline::Pipeline;
use crate::source::HeaderSource;
use crate::util::config::Config;
use crate::util::diagnostic::Diagnostics;
use crate::util::fs::{discover_headers, write_string};

/// Module name used when neither the command line, the config nor the
/// inputs provide one.
const DEFAULT_MODULE: &str = "bindings";

/// Outcome of running the pipeline over a set of inputs.
#[derive(Debug)]
pub struct Binding {
    pub headers: Vec<PathBuf>,
    /// `None` when a fatal diagnostic stopped the pipeline
    pub bir: Option<Bir>,
    pub diagnostics: Diagnostics,
}

/// Discover headers under `base` and run the pipeline over them.
pub fn bind(base: &Path, inputs: &[String], config: &Config) -> Result<Binding> {
    let headers = discover_headers(base, inputs)?;
    let pipeline = Pipeline::new().with_filter(config.visibility_filter()?);

    let mut source = HeaderSource::new(&headers);
    let mut diagnostics = Diagnostics::new();
    let bir = match pipeline.run(&mut source, &mut diagnostics) {
        Ok(bir) => Some(bir),
        Err(err) => {
            tracing::debug!("pipeline stopped: {}", err);
            None
        }
    };

    Ok(Binding {
        headers,
        bir,
        diagnostics,
    })
}

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Files, directories or glob patterns
    pub inputs: Vec<String>,

    /// Directory the inputs are relative to
    pub base: PathBuf,

    /// Module name override
    pub module: Option<String>,

    /// Output directory override
    pub out_dir: Option<PathBuf>,

    /// Skip the `.pyi` stub
    pub no_stub: bool,

    /// Skip the `.bir.json` document
    pub no_bir: bool,
}

/// Result of a generate run.
#[derive(Debug)]
pub struct GenerateResult {
    pub binding: Binding,
    pub module: String,
    /// Files written, in order
    pub written: Vec<PathBuf>,
}

/// Run the pipeline and write the requested outputs. Nothing is written
/// when the pipeline produced no BIR.
pub fn generate(opts: &GenerateOptions, config: &Config) -> Result<GenerateResult> {
    let binding = bind(&opts.base, &opts.inputs, config)?;
    let module = module_name(opts, config, &binding.headers);
    let out_dir = opts
        .out_dir
        .clone()
        .or_else(|| config.output.dir.clone())
        .map(|dir| opts.base.join(dir))
        .unwrap_or_else(|| opts.base.clone());

    let mut written = Vec::new();
    if let Some(bir) = &binding.bir {
        if config.write_stub() && !opts.no_stub {
            let path = out_dir.join(format!("{}.pyi", module));
            let text = render_stub(bir, &config.stub_options())
                .with_context(|| format!("failed to render stub for module `{}`", module))?;
            write_string(&path, &text)?;
            written.push(path);
        }
        if config.write_bir() && !opts.no_bir {
            let path = out_dir.join(format!("{}.bir.json", module));
            let json = BirDocument::to_json(bir).context("failed to serialize BIR")?;
            write_string(&path, &json)?;
            written.push(path);
        }
    }

    for path in &written {
        tracing::info!("Wrote {}", path.display());
    }

    Ok(GenerateResult {
        binding,
        module,
        written,
    })
}

fn module_name(opts: &GenerateOptions, config: &Config, headers: &[PathBuf]) -> String {
    opts.module
        .clone()
        .or_else(|| config.stub.module_name.clone())
        .or_else(|| {
            headers
                .first()
                .and_then(|h| h.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_MODULE.to_string())
}
