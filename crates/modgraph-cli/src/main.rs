use std::time::Instant;

use clap::Parser;

use modgraph::{Command, ModgraphOptions, ProcessingOptions, TargetOptions, run_main};
use modgraph_core::Result;

#[derive(Parser, Debug)]
#[command(
    name = "modgraph",
    about = "modgraph: evaluate module rules for a target and assemble the dependency graph",
    version
)]
pub struct Cli {
    /// Individual rule files to load (repeatable)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        global = true,
        action = clap::ArgAction::Append
    )]
    files: Vec<String>,

    /// Directories to scan recursively for *.module.toml files (repeatable)
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        global = true,
        action = clap::ArgAction::Append
    )]
    dirs: Vec<String>,

    /// Workspace config file (defaults to modgraph.toml in the first --dir)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Output file path (writes to file instead of stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", global = true)]
    output: Option<String>,

    #[command(flatten)]
    processing: ProcessingOptions,

    #[command(flatten)]
    target: TargetOptions,

    #[command(subcommand)]
    command: Command,
}

pub fn run(args: Cli) -> Result<()> {
    let total_start = Instant::now();

    // Initialize tracing subscriber for logging
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let opts = ModgraphOptions {
        files: args.files,
        dirs: args.dirs,
        config: args.config,
        processing: args.processing,
        target: args.target,
    };

    let result = run_main(&opts, &args.command)
        .and_then(|output| modgraph::output::write_output(args.output.as_deref(), &output));

    if let Err(e) = &result {
        tracing::error!(error = %e, "execution failed");
    }

    tracing::info!(total_secs = total_start.elapsed().as_secs_f64(), "complete");
    result
}

pub fn main() -> Result<()> {
    let args = Cli::parse();
    run(args)
}
