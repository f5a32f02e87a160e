//! Shared CLI options for modgraph.
//!
//! Target flags override the `[target]` table of `modgraph.toml`; render
//! flags map onto [`RenderOptions`].

use clap::Args;
use modgraph_core::{Configuration, LinkType, Platform, TargetContext, TargetType};
use modgraph_dot::RenderOptions;

/// Flags describing the build target modules are evaluated against.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetOptions {
    /// Target platform, e.g. Win64, Linux, Mac.
    #[arg(long, value_name = "PLATFORM", global = true)]
    pub platform: Option<Platform>,

    /// Build configuration, e.g. Debug, Development, Shipping.
    #[arg(long, value_name = "CONFIGURATION", global = true)]
    pub configuration: Option<Configuration>,

    /// Target type: Game, Client, Server, Editor or Program.
    #[arg(long = "target-type", value_name = "TYPE", global = true)]
    pub target_type: Option<TargetType>,

    /// Link type: modular or monolithic.
    #[arg(long = "link-type", value_name = "LINK", global = true)]
    pub link_type: Option<LinkType>,

    /// Build with editor support.
    #[arg(long = "build-editor", global = true, conflicts_with = "no_build_editor")]
    pub build_editor: bool,

    /// Build without editor support, even if the config enables it.
    #[arg(long = "no-build-editor", global = true)]
    pub no_build_editor: bool,

    /// Compile against the engine, even if the config disables it.
    #[arg(long = "engine", global = true, conflicts_with = "no_engine")]
    pub engine: bool,

    /// Do not compile against the engine.
    #[arg(long = "no-engine", global = true)]
    pub no_engine: bool,

    /// Build developer tools.
    #[arg(
        long = "developer-tools",
        global = true,
        conflicts_with = "no_developer_tools"
    )]
    pub developer_tools: bool,

    /// Skip developer tools, even if the config enables them.
    #[arg(long = "no-developer-tools", global = true)]
    pub no_developer_tools: bool,

    /// Enable a named feature (repeatable).
    #[arg(
        long = "feature",
        value_name = "NAME",
        global = true,
        action = clap::ArgAction::Append
    )]
    pub features: Vec<String>,
}

impl TargetOptions {
    /// Overlay the flags that were given on top of `target`.
    pub fn apply(&self, mut target: TargetContext) -> TargetContext {
        if let Some(platform) = self.platform {
            target.platform = platform;
        }
        if let Some(configuration) = self.configuration {
            target.configuration = configuration;
        }
        if let Some(target_type) = self.target_type {
            target.target_type = target_type;
        }
        if let Some(link_type) = self.link_type {
            target.link_type = link_type;
        }
        if let Some(build_editor) = switch(self.build_editor, self.no_build_editor) {
            target.build_editor = build_editor;
        }
        if let Some(engine) = switch(self.engine, self.no_engine) {
            target.compile_against_engine = engine;
        }
        if let Some(tools) = switch(self.developer_tools, self.no_developer_tools) {
            target.build_developer_tools = tools;
        }
        target.features.extend(self.features.iter().cloned());
        target
    }
}

/// `--flag` / `--no-flag` pair: `None` keeps the configured value.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Options for controlling processing behavior.
#[derive(Args, Debug, Clone, Default)]
pub struct ProcessingOptions {
    /// Load and evaluate rule files in parallel.
    #[arg(long, global = true)]
    pub parallel: bool,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Options for the `graph` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Only render this module and what it depends on.
    #[arg(long, value_name = "MODULE")]
    pub root: Option<String>,

    /// Group modules into one cluster per module kind.
    #[arg(long = "cluster-by-kind")]
    pub cluster_by_kind: bool,

    /// Leave out private dependencies.
    #[arg(long = "hide-private")]
    pub hide_private: bool,

    /// Include dynamically loaded dependencies.
    #[arg(long = "show-dynamic")]
    pub show_dynamic: bool,

    /// Keep modules that have no rendered edges.
    #[arg(long = "show-orphans")]
    pub show_orphans: bool,
}

impl From<&RenderArgs> for RenderOptions {
    fn from(args: &RenderArgs) -> Self {
        Self {
            root: args.root.clone(),
            cluster_by_kind: args.cluster_by_kind,
            show_private: !args.hide_private,
            show_dynamic: args.show_dynamic,
            show_orphan_nodes: args.show_orphans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_target() {
        let base = TargetContext::default().with_feature("with_tracing");
        let options = TargetOptions {
            platform: Some(Platform::Win64),
            target_type: Some(TargetType::Editor),
            build_editor: true,
            no_engine: true,
            features: vec!["with_chaos".to_string()],
            ..TargetOptions::default()
        };
        let target = options.apply(base);

        assert_eq!(target.platform, Platform::Win64);
        assert_eq!(target.target_type, TargetType::Editor);
        assert!(target.build_editor);
        assert!(!target.compile_against_engine);
        assert!(target.has_feature("with_tracing"));
        assert!(target.has_feature("with_chaos"));
    }

    #[test]
    fn test_no_flags_keep_target() {
        let base = TargetContext::for_editor(Platform::Mac);
        assert_eq!(TargetOptions::default().apply(base.clone()), base);
    }

    #[test]
    fn test_negative_flags_override_config() {
        let configured = TargetContext::for_editor(Platform::Linux).with_compile_against_engine(false);
        let options = TargetOptions {
            no_build_editor: true,
            no_developer_tools: true,
            engine: true,
            ..TargetOptions::default()
        };
        let target = options.apply(configured);

        assert!(!target.build_editor);
        assert!(!target.build_developer_tools);
        assert!(target.compile_against_engine);
    }

    #[test]
    fn test_render_args() {
        let args = RenderArgs {
            hide_private: true,
            ..RenderArgs::default()
        };
        let options = RenderOptions::from(&args);
        assert!(!options.show_private);
        assert!(!options.show_dynamic);
    }
}
