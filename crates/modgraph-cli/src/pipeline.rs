//! Core processing pipeline: discover → load → evaluate → assemble.

use std::time::Instant;

use tracing::info;

use modgraph_core::{
    DependencyGraph, Error, GraphOptions, ModuleDescriptor, Result, TargetContext,
    WorkspaceConfig, evaluate_all, load_rule_files,
};

use crate::ModgraphOptions;
use crate::discovery::discover_rule_files;

/// Descriptors evaluated for one target, plus the settings used to link them.
#[derive(Debug)]
pub struct Evaluation {
    pub target: TargetContext,
    pub graph_options: GraphOptions,
    pub descriptors: Vec<ModuleDescriptor>,
}

impl Evaluation {
    pub fn descriptor(&self, name: &str) -> Result<&ModuleDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name() == name)
            .ok_or_else(|| Error::unknown_module(name))
    }

    /// Link the descriptors into a dependency graph.
    pub fn assemble(self) -> Result<DependencyGraph> {
        DependencyGraph::assemble(self.descriptors, &self.graph_options)
    }
}

/// `--config` if given, else `modgraph.toml` in the first `--dir`, else defaults.
pub fn load_config(opts: &ModgraphOptions) -> Result<WorkspaceConfig> {
    if let Some(path) = &opts.config {
        return WorkspaceConfig::from_path(path);
    }
    match opts.dirs.first() {
        Some(dir) => Ok(WorkspaceConfig::discover(dir)?.unwrap_or_default()),
        None => Ok(WorkspaceConfig::default()),
    }
}

/// Discover, load and evaluate every rule file for the configured target.
pub fn evaluate(opts: &ModgraphOptions) -> Result<Evaluation> {
    let config = load_config(opts)?;
    let target = opts.target.apply(config.target);
    info!(
        platform = %target.platform,
        configuration = %target.configuration,
        target_type = %target.target_type,
        link_type = %target.link_type,
        "evaluating target"
    );

    let files = discover_rule_files(opts)?;
    let parallel = opts.processing.parallel;

    let rules = load_rule_files(&files, parallel)?;

    let eval_start = Instant::now();
    let descriptors = evaluate_all(&rules, &target, parallel)?;
    info!(
        "Evaluation: {:.2}s ({} modules)",
        eval_start.elapsed().as_secs_f64(),
        descriptors.len()
    );

    Ok(Evaluation {
        target,
        graph_options: config.graph,
        descriptors,
    })
}

/// Run the full pipeline up to an assembled graph.
pub fn build_graph(opts: &ModgraphOptions) -> Result<DependencyGraph> {
    evaluate(opts)?.assemble()
}
