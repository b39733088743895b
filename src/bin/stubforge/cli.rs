//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// stubforge - Python stubs from C/C++ headers
#[derive(Parser)]
#[command(name = "stubforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a Python stub and a BIR document
    Generate(GenerateArgs),

    /// Print the BIR document to stdout
    Dump(DumpArgs),

    /// Run the pipeline and report diagnostics only
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Header inputs shared by every pipeline command.
#[derive(Args)]
pub struct InputArgs {
    /// Header files, directories or glob patterns
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Fail with exit status 2 when any warning is reported
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory (defaults to the current directory)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Module name (defaults to the first header's file stem)
    #[arg(short, long)]
    pub module: Option<String>,

    /// Don't write the .pyi stub
    #[arg(long)]
    pub no_stub: bool,

    /// Don't write the .bir.json document
    #[arg(long)]
    pub no_bir: bool,
}

#[derive(Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print diagnostics as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
