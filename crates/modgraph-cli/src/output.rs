//! Output generation (JSON, plain text, DOT).

use std::fs;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use modgraph_core::{DependencyEdge, DependencyGraph, Error, ErrorKind, Result};
use modgraph_dot::{RenderOptions, render_graph};

use crate::options::RenderArgs;

/// Pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::SerializationFailed, err.to_string())
            .with_operation("output::to_json")
            .set_source(err)
    })
}

/// One module per line.
pub fn lines<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Name (scope)` lines, naming the module at the far end of each edge.
pub fn edge_lines(edges: &[&DependencyEdge], reverse: bool) -> String {
    lines(edges.iter().map(|edge| {
        let other = if reverse { &edge.from } else { &edge.to };
        let scope: &'static str = edge.scope.into();
        format!("{} ({})", other, scope.to_ascii_lowercase())
    }))
}

/// Summary printed by `check`.
pub fn check_report(graph: &DependencyGraph) -> String {
    let mut report = vec![format!(
        "ok: {} modules, {} edges",
        graph.len(),
        graph.edges().len()
    )];
    for cycle in graph.allowed_cycles() {
        report.push(format!("allowed cycle: {}", cycle.join(", ")));
    }
    report.join("\n")
}

/// Generate DOT output for a dependency graph.
pub fn generate_dot_output(graph: &DependencyGraph, args: &RenderArgs) -> Result<String> {
    if let Some(root) = &args.root {
        if !graph.contains(root) {
            return Err(Error::unknown_module(root.as_str()).with_operation("output::graph"));
        }
    }

    let render_start = Instant::now();
    let result = render_graph(graph, &RenderOptions::from(args));
    info!(
        "Graph rendering: {:.2}s",
        render_start.elapsed().as_secs_f64()
    );
    Ok(result)
}

/// Write `text` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&str>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|err| {
                Error::from(err)
                    .with_operation("output::write")
                    .with_context("path", path)
            })?;
            info!(path, "output written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgraph_core::{GraphOptions, ModuleDescriptor};
    use pretty_assertions::assert_eq;

    fn graph() -> DependencyGraph {
        let descriptors = vec![
            ModuleDescriptor::builder("Core").build().unwrap(),
            ModuleDescriptor::builder("Engine")
                .public_dependencies(["Core"])
                .private_dependencies(["Slate"])
                .build()
                .unwrap(),
            ModuleDescriptor::builder("Slate")
                .public_dependencies(["Core"])
                .build()
                .unwrap(),
        ];
        DependencyGraph::assemble(descriptors, &GraphOptions::default()).unwrap()
    }

    #[test]
    fn test_check_report() {
        assert_eq!(check_report(&graph()), "ok: 3 modules, 3 edges");
    }

    #[test]
    fn test_edge_lines() {
        let graph = graph();
        let deps = graph.dependencies("Engine").unwrap();
        assert_eq!(edge_lines(&deps, false), "Core (public)\nSlate (private)");

        let dependents = graph.dependents("Core").unwrap();
        assert_eq!(edge_lines(&dependents, true), "Engine (public)\nSlate (public)");
    }

    #[test]
    fn test_graph_root_must_exist() {
        let args = RenderArgs {
            root: Some("Nope".to_string()),
            ..RenderArgs::default()
        };
        let err = generate_dot_output(&graph(), &args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModuleNotFound);
    }
}
