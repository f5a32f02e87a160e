//! modgraph command-line interface.
//!
pub mod discovery;
pub mod options;
pub mod output;
pub mod pipeline;

use std::fs;
use std::io::{self, Read};

use clap::Subcommand;

use modgraph_core::{ChangelistDescription, Error, Result};

pub use options::{ProcessingOptions, RenderArgs, TargetOptions};
pub use pipeline::{Evaluation, build_graph, evaluate};

/// Options for running modgraph.
#[derive(Debug, Clone, Default)]
pub struct ModgraphOptions {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
    pub config: Option<String>,
    pub processing: ProcessingOptions,
    pub target: TargetOptions,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the evaluated descriptor of a module as JSON
    Describe {
        #[arg(value_name = "MODULE")]
        module: String,
    },

    /// Print the build order, one module per line
    Order,

    /// Assemble the graph and report problems
    Check,

    /// Print the compile environment of a module as JSON
    Env {
        #[arg(value_name = "MODULE")]
        module: String,
    },

    /// List the dependencies of a module
    Deps {
        #[arg(value_name = "MODULE")]
        module: String,

        /// Follow public and private edges transitively
        #[arg(long)]
        transitive: bool,

        /// List dependents instead of dependencies
        #[arg(long)]
        reverse: bool,
    },

    /// Render the dependency graph in DOT format
    Graph {
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Split a changelist description into author tag and body lines
    ParseDescription {
        /// Read the description from FILE instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<String>,

        /// Line ending separating lines; `\n` and `\r` escapes are accepted
        #[arg(long = "line-ending", value_name = "STR", default_value = "\\n")]
        line_ending: String,
    },
}

/// Main entry point. Returns the text to print.
pub fn run_main(opts: &ModgraphOptions, command: &Command) -> Result<String> {
    match command {
        Command::Describe { module } => {
            let evaluation = evaluate(opts)?;
            output::to_json(evaluation.descriptor(module)?)
        }
        Command::Order => {
            let graph = build_graph(opts)?;
            Ok(output::lines(graph.build_order()))
        }
        Command::Check => {
            let graph = build_graph(opts)?;
            Ok(output::check_report(&graph))
        }
        Command::Env { module } => {
            let graph = build_graph(opts)?;
            output::to_json(&graph.compile_environment(module)?)
        }
        Command::Deps {
            module,
            transitive,
            reverse,
        } => {
            let graph = build_graph(opts)?;
            match (*transitive, *reverse) {
                (true, false) => Ok(output::lines(graph.transitive_dependencies(module)?)),
                (true, true) => Ok(output::lines(graph.transitive_dependents(module)?)),
                (false, false) => Ok(output::edge_lines(&graph.dependencies(module)?, false)),
                (false, true) => Ok(output::edge_lines(&graph.dependents(module)?, true)),
            }
        }
        Command::Graph { render } => {
            let graph = build_graph(opts)?;
            output::generate_dot_output(&graph, render)
        }
        Command::ParseDescription { input, line_ending } => {
            let text = read_input(input.as_deref())?;
            let parsed = ChangelistDescription::parse(&text, &unescape(line_ending))?;
            output::to_json(&parsed)
        }
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("read_input")
                .with_context("path", path)
        }),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| Error::from(err).with_operation("read_input"))?;
            Ok(text)
        }
    }
}

/// `\r\n` typed on a shell arrives as backslash sequences.
fn unescape(line_ending: &str) -> String {
    line_ending.replace("\\r", "\r").replace("\\n", "\n")
}
