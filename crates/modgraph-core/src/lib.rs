//! Module descriptors, target evaluation and dependency graph assembly.
//!
//! The flow of one invocation:
//!
//! 1. load [`RuleFile`]s (or any other [`ModuleRules`]),
//! 2. evaluate them against a [`TargetContext`] into [`ModuleDescriptor`]s,
//! 3. [`DependencyGraph::assemble`] the descriptors,
//! 4. query build order, closures and [`CompileEnvironment`]s.

#[macro_use]
pub mod target;
pub mod changelist;
pub mod condition;
pub mod config;
pub mod descriptor;
pub mod environment;
pub mod graph;
pub mod rules;

pub use modgraph_error::{Error, ErrorKind, Result};

pub use changelist::ChangelistDescription;
pub use condition::Condition;
pub use config::{CONFIG_FILE_NAME, WorkspaceConfig};
pub use descriptor::{
    DependencyEdge, DependencyScope, ModuleDescriptor, ModuleDescriptorBuilder, ModuleKind,
};
pub use environment::CompileEnvironment;
pub use graph::{DependencyGraph, GraphOptions};
pub use rules::{ModuleRules, RULE_FILE_SUFFIX, RuleFile, evaluate_all, load_rule_files};
pub use target::{Configuration, LinkType, Platform, PlatformGroup, TargetContext, TargetType};
