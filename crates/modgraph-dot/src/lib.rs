//! Graph rendering module for producing DOT format output.
//!
//! This module transforms an assembled `DependencyGraph` into DOT format for
//! visualization. Public edges are solid, private edges dashed and dynamically
//! loaded edges dotted. Modules can optionally be grouped into one subgraph
//! cluster per [`ModuleKind`](modgraph_core::ModuleKind).

mod dot;

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Instant;

use modgraph_core::{DependencyEdge, DependencyGraph, DependencyScope, ModuleDescriptor};
use tracing::{info, warn};

pub use dot::{DotBuilder, escape_label, sanitize_id, shape_for_kind, style_for_scope};

const EMPTY_GRAPH: &str = "digraph G {\n}\n";

/// Controls which parts of the graph are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Only render `root` and the modules it reaches over visible edges.
    pub root: Option<String>,
    /// Group nodes into one cluster per module kind.
    pub cluster_by_kind: bool,
    /// Render private dependencies (dashed).
    pub show_private: bool,
    /// Render dynamically loaded dependencies (dotted).
    pub show_dynamic: bool,
    /// Keep modules with no visible edges.
    pub show_orphan_nodes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            root: None,
            cluster_by_kind: false,
            show_private: true,
            show_dynamic: false,
            show_orphan_nodes: false,
        }
    }
}

impl RenderOptions {
    fn shows(&self, scope: DependencyScope) -> bool {
        match scope {
            DependencyScope::Public => true,
            DependencyScope::Private => self.show_private,
            DependencyScope::Dynamic => self.show_dynamic,
        }
    }
}

/// Render the dependency graph to DOT format.
pub fn render_graph(graph: &DependencyGraph, options: &RenderOptions) -> String {
    if graph.is_empty() {
        return EMPTY_GRAPH.to_string();
    }

    let render_start = Instant::now();

    let included: HashSet<&str> = match options.root.as_deref() {
        Some(root) if !graph.contains(root) => {
            warn!(root, "render root is not a known module");
            return EMPTY_GRAPH.to_string();
        }
        Some(root) => closure(graph, root, options),
        None => graph.modules().map(ModuleDescriptor::name).collect(),
    };

    let edges: Vec<&DependencyEdge> = graph
        .edges()
        .iter()
        .filter(|edge| options.shows(edge.scope))
        .filter(|edge| included.contains(edge.from.as_str()) && included.contains(edge.to.as_str()))
        .collect();

    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()])
        .collect();

    let nodes: Vec<&ModuleDescriptor> = graph
        .modules()
        .filter(|module| included.contains(module.name()))
        .filter(|module| {
            options.show_orphan_nodes
                || connected.contains(module.name())
                || options.root.as_deref() == Some(module.name())
        })
        .collect();

    if nodes.is_empty() {
        return EMPTY_GRAPH.to_string();
    }

    let mut builder = DotBuilder::new("G");
    builder.attr("rankdir", "LR");
    builder.node_style(r#"fontname="Helvetica""#);
    builder.blank();

    if options.cluster_by_kind {
        let mut by_kind: BTreeMap<_, Vec<&ModuleDescriptor>> = BTreeMap::new();
        for module in &nodes {
            by_kind.entry(module.kind()).or_default().push(module);
        }
        for (kind, modules) in by_kind {
            let label = kind.to_string();
            builder.start_cluster(&label.to_ascii_lowercase(), &label);
            for module in modules {
                write_node(&mut builder, module);
            }
            builder.end_cluster();
        }
    } else {
        for module in &nodes {
            write_node(&mut builder, module);
        }
        builder.blank();
    }

    for edge in &edges {
        let from = sanitize_id(&edge.from);
        let to = sanitize_id(&edge.to);
        match edge.scope {
            DependencyScope::Public => builder.edge_with_attrs(&from, &to, &[]),
            scope => builder.edge_with_attrs(&from, &to, &[("style", style_for_scope(scope))]),
        };
    }

    info!(
        "Graph rendering: {:.2}s ({} nodes, {} edges)",
        render_start.elapsed().as_secs_f64(),
        nodes.len(),
        edges.len()
    );

    builder.build()
}

fn write_node(builder: &mut DotBuilder, module: &ModuleDescriptor) {
    builder.node_full(
        &sanitize_id(module.name()),
        &[("label", module.name()), ("shape", shape_for_kind(module.kind()))],
    );
}

/// `root` plus every module it reaches over edges the options render.
fn closure<'a>(graph: &'a DependencyGraph, root: &'a str, options: &RenderOptions) -> HashSet<&'a str> {
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for edge in graph.edges() {
            if edge.from == current && options.shows(edge.scope) && seen.insert(edge.to.as_str()) {
                queue.push_back(edge.to.as_str());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgraph_core::{GraphOptions, ModuleKind};
    use pretty_assertions::assert_eq;

    fn sample() -> DependencyGraph {
        let descriptors = vec![
            ModuleDescriptor::builder("Core").build().unwrap(),
            ModuleDescriptor::builder("Engine")
                .public_dependencies(["Core"])
                .private_dependencies(["Renderer"])
                .dynamically_loaded(["Niagara"])
                .build()
                .unwrap(),
            ModuleDescriptor::builder("Renderer")
                .public_dependencies(["Core"])
                .build()
                .unwrap(),
            ModuleDescriptor::builder("Niagara")
                .kind(ModuleKind::Plugin)
                .build()
                .unwrap(),
            ModuleDescriptor::builder("ShaderCompileWorker")
                .kind(ModuleKind::Program)
                .build()
                .unwrap(),
        ];
        DependencyGraph::assemble(descriptors, &GraphOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::assemble(Vec::new(), &GraphOptions::default()).unwrap();
        assert_eq!(render_graph(&graph, &RenderOptions::default()), "digraph G {\n}\n");
    }

    #[test]
    fn test_default_render() {
        let dot = render_graph(&sample(), &RenderOptions::default());

        assert!(dot.starts_with("digraph G {\n"));
        assert!(dot.contains("  Core[label=\"Core\", shape=\"box\"];\n"));
        assert!(dot.contains("  Engine -> Core;\n"));
        assert!(dot.contains("  Engine -> Renderer [style=\"dashed\"];\n"));
        assert!(!dot.contains("Niagara"));
        assert!(!dot.contains("ShaderCompileWorker"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_hide_private_and_show_dynamic() {
        let options = RenderOptions {
            show_private: false,
            show_dynamic: true,
            ..RenderOptions::default()
        };
        let dot = render_graph(&sample(), &options);

        assert!(!dot.contains("Engine -> Renderer"));
        assert!(dot.contains("  Renderer -> Core;\n"));
        assert!(dot.contains("  Engine -> Niagara [style=\"dotted\"];\n"));
        assert!(dot.contains("  Niagara[label=\"Niagara\", shape=\"component\"];\n"));
    }

    #[test]
    fn test_orphans_and_clusters() {
        let options = RenderOptions {
            cluster_by_kind: true,
            show_orphan_nodes: true,
            ..RenderOptions::default()
        };
        let dot = render_graph(&sample(), &options);

        assert!(dot.contains("  subgraph cluster_engine {\n    label=\"Engine\";\n"));
        assert!(dot.contains("  subgraph cluster_program {\n    label=\"Program\";\n"));
        assert!(dot.contains("    ShaderCompileWorker[label=\"ShaderCompileWorker\", shape=\"ellipse\"];\n"));
        assert!(dot.contains("    Niagara[label=\"Niagara\", shape=\"component\"];\n"));
    }

    #[test]
    fn test_root_restricts_to_closure() {
        let options = RenderOptions {
            root: Some("Renderer".to_string()),
            ..RenderOptions::default()
        };
        let dot = render_graph(&sample(), &options);

        assert!(dot.contains("  Renderer -> Core;\n"));
        assert!(!dot.contains("Engine"));

        let lonely = RenderOptions {
            root: Some("ShaderCompileWorker".to_string()),
            ..RenderOptions::default()
        };
        let dot = render_graph(&sample(), &lonely);
        assert!(dot.contains("ShaderCompileWorker[label"));
    }

    #[test]
    fn test_unknown_root_is_empty() {
        let options = RenderOptions {
            root: Some("Missing".to_string()),
            ..RenderOptions::default()
        };
        assert_eq!(render_graph(&sample(), &options), "digraph G {\n}\n");
    }
}
