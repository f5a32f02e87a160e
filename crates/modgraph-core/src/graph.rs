//! Dependency graph assembly: link descriptors, reject cycles, order modules.
//!
//! The assembler takes every evaluated [`ModuleDescriptor`] of a build and
//!
//! 1. rejects duplicate module names,
//! 2. resolves each dependency edge against the known modules,
//! 3. finds strongly connected components over public and private edges and
//!    rejects any cycle that is not explicitly allowed,
//! 4. computes a deterministic dependency-first build order.
//!
//! Dynamically loaded modules are recorded as edges but never constrain order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::time::Instant;

use indexmap::{IndexMap, IndexSet};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::descriptor::{DependencyEdge, DependencyScope, ModuleDescriptor};
use crate::{Error, Result};

/// Knobs for [`DependencyGraph::assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphOptions {
    /// Drop edges to undeclared modules with a warning instead of failing.
    pub allow_unknown_modules: bool,
    /// `(from, to)` edges that may close a cycle, in addition to the ones each
    /// module declares in its own `circularly_referenced` set.
    pub circular_allow_list: Vec<(String, String)>,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_unknown_modules(mut self, allow: bool) -> Self {
        self.allow_unknown_modules = allow;
        self
    }

    pub fn with_allowed_cycle_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.circular_allow_list.push((from.into(), to.into()));
        self
    }

    fn allows(&self, from: &str, to: &str) -> bool {
        self.circular_allow_list
            .iter()
            .any(|(f, t)| f == from && t == to)
    }
}

/// The linked, validated dependency graph of one build.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Descriptors sorted by name; position `i` is node `NodeIndex::new(i)`.
    pub(crate) modules: IndexMap<String, ModuleDescriptor>,
    /// All resolved edges, including dynamic ones and allowed back edges.
    edges: Vec<DependencyEdge>,
    /// Static edges minus allowed back edges. Acyclic.
    order_graph: DiGraph<(), DependencyScope>,
    build_order: Vec<String>,
    allowed_cycles: Vec<Vec<String>>,
}

impl DependencyGraph {
    /// Link `descriptors` into a graph.
    pub fn assemble<I>(descriptors: I, options: &GraphOptions) -> Result<Self>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let start = Instant::now();

        let mut sorted: Vec<ModuleDescriptor> = descriptors.into_iter().collect();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));

        let mut modules = IndexMap::with_capacity(sorted.len());
        for descriptor in sorted {
            let name = descriptor.name().to_string();
            if modules.contains_key(&name) {
                return Err(Error::duplicate_module(name).with_operation("graph::assemble"));
            }
            modules.insert(name, descriptor);
        }

        let edges = resolve_edges(&modules, options)?;

        let mut full = DiGraph::<(), DependencyScope>::with_capacity(modules.len(), edges.len());
        for _ in 0..modules.len() {
            full.add_node(());
        }
        for edge in edges.iter().filter(|e| e.scope.is_static()) {
            full.add_edge(node(&modules, &edge.from), node(&modules, &edge.to), edge.scope);
        }

        let (order_graph, allowed_cycles) = break_allowed_cycles(&modules, full, options)?;
        let build_order = dependency_first_order(&modules, &order_graph)?;

        info!(
            "Graph assembly: {:.2}s ({} modules, {} edges)",
            start.elapsed().as_secs_f64(),
            modules.len(),
            edges.len()
        );

        Ok(Self {
            modules,
            edges,
            order_graph,
            build_order,
            allowed_cycles,
        })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    /// Descriptors in name order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Modules ordered so every module comes after all of its static
    /// dependencies. Ties are broken by name.
    pub fn build_order(&self) -> &[String] {
        &self.build_order
    }

    /// Cycles that exist in the declarations but were allowed. Each cycle is
    /// listed by its module names in name order.
    pub fn allowed_cycles(&self) -> &[Vec<String>] {
        &self.allowed_cycles
    }

    /// Direct dependencies of `name` (public, private, dynamic).
    pub fn dependencies(&self, name: &str) -> Result<Vec<&DependencyEdge>> {
        self.expect_module(name)?;
        Ok(self.edges.iter().filter(|e| e.from == name).collect())
    }

    /// Modules that directly depend on `name`, in name order.
    pub fn dependents(&self, name: &str) -> Result<Vec<&DependencyEdge>> {
        self.expect_module(name)?;
        Ok(self.edges.iter().filter(|e| e.to == name).collect())
    }

    /// Every module reachable from `name` over public and private edges, in
    /// build order. This is what a monolithic link of `name` pulls in.
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<&str>> {
        self.expect_module(name)?;
        let reachable = self.reachable(name, |edge| edge.scope.is_static());
        Ok(self
            .build_order
            .iter()
            .filter(|module| reachable.contains(module.as_str()))
            .map(String::as_str)
            .collect())
    }

    /// Every module that reaches `name` over public and private edges, in
    /// build order.
    pub fn transitive_dependents(&self, name: &str) -> Result<Vec<&str>> {
        self.expect_module(name)?;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.to == current && e.scope.is_static()) {
                if edge.from != name && seen.insert(edge.from.as_str()) {
                    queue.push_back(edge.from.as_str());
                }
            }
        }
        Ok(self
            .build_order
            .iter()
            .filter(|module| seen.contains(module.as_str()))
            .map(String::as_str)
            .collect())
    }

    /// Modules reachable from `name` following edges accepted by `follow`,
    /// excluding `name` itself.
    pub(crate) fn reachable<F>(&self, name: &str, follow: F) -> HashSet<&str>
    where
        F: Fn(&DependencyEdge) -> bool,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.from == current && follow(e)) {
                if edge.to != name && seen.insert(edge.to.as_str()) {
                    queue.push_back(edge.to.as_str());
                }
            }
        }
        seen
    }

    pub(crate) fn expect_module(&self, name: &str) -> Result<&ModuleDescriptor> {
        self.modules
            .get(name)
            .ok_or_else(|| Error::unknown_module(name))
    }

    /// Number of edges that constrain ordering.
    pub fn ordering_edge_count(&self) -> usize {
        self.order_graph.edge_count()
    }
}

fn node(modules: &IndexMap<String, ModuleDescriptor>, name: &str) -> NodeIndex {
    // Edges are only created for known modules.
    NodeIndex::new(modules.get_index_of(name).unwrap_or_default())
}

fn resolve_edges(
    modules: &IndexMap<String, ModuleDescriptor>,
    options: &GraphOptions,
) -> Result<Vec<DependencyEdge>> {
    let mut edges = Vec::new();
    let mut missing: Vec<(String, String)> = Vec::new();

    for descriptor in modules.values() {
        for edge in descriptor.edges() {
            if modules.contains_key(&edge.to) {
                edges.push(edge);
            } else {
                missing.push((edge.from, edge.to));
            }
        }
    }

    if missing.is_empty() {
        return Ok(edges);
    }

    if options.allow_unknown_modules {
        for (from, to) in &missing {
            warn!(module = %from, missing = %to, "dropping dependency on unknown module");
        }
        return Ok(edges);
    }

    let listing: Vec<String> = missing
        .iter()
        .map(|(from, to)| format!("{from}->{to}"))
        .collect();
    let (from, to) = &missing[0];
    Err(Error::module_not_found(from.clone(), to.clone())
        .with_context("unresolved", listing.join(","))
        .with_operation("graph::assemble"))
}

/// Remove allowed back edges from every cycle. Fails on the first cycle that
/// survives.
fn break_allowed_cycles(
    modules: &IndexMap<String, ModuleDescriptor>,
    mut graph: DiGraph<(), DependencyScope>,
    options: &GraphOptions,
) -> Result<(DiGraph<(), DependencyScope>, Vec<Vec<String>>)> {
    let name_of = |index: NodeIndex| modules.get_index(index.index()).map(|(name, _)| name.as_str());

    let cyclic: Vec<Vec<NodeIndex>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .collect();
    if cyclic.is_empty() {
        return Ok((graph, Vec::new()));
    }

    let mut allowed_cycles = Vec::with_capacity(cyclic.len());
    for component in &cyclic {
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let back_edges: Vec<_> = graph
            .edge_indices()
            .filter(|edge| {
                let Some((from, to)) = graph.edge_endpoints(*edge) else {
                    return false;
                };
                if !members.contains(&from) || !members.contains(&to) {
                    return false;
                }
                let (Some(from_name), Some(to_name)) = (name_of(from), name_of(to)) else {
                    return false;
                };
                let declared = modules[from.index()].allows_circular_reference(to_name);
                declared || options.allows(from_name, to_name)
            })
            .collect();

        for edge in back_edges.into_iter().rev() {
            if let Some((from, to)) = graph.edge_endpoints(edge) {
                debug!(
                    from = name_of(from).unwrap_or_default(),
                    to = name_of(to).unwrap_or_default(),
                    "ignoring allowed circular reference for ordering"
                );
            }
            graph.remove_edge(edge);
        }

        let mut names: Vec<String> = component
            .iter()
            .filter_map(|index| name_of(*index).map(str::to_string))
            .collect();
        names.sort();
        allowed_cycles.push(names);
    }

    if let Some(component) = tarjan_scc(&graph)
        .into_iter()
        .find(|component| component.len() > 1)
    {
        let cycle = find_cycle(&graph, &component);
        let names: Vec<&str> = cycle.iter().filter_map(|index| name_of(*index)).collect();
        return Err(Error::circular_dependency(names).with_operation("graph::assemble"));
    }

    allowed_cycles.sort();
    Ok((graph, allowed_cycles))
}

/// A concrete closed path through a strongly connected component, starting
/// and ending at the component's smallest node.
fn find_cycle(graph: &DiGraph<(), DependencyScope>, component: &[NodeIndex]) -> Vec<NodeIndex> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let Some(&start) = component.iter().min() else {
        return Vec::new();
    };

    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut seen = HashSet::from([start]);

    while let Some(current) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = graph
            .neighbors_directed(current, Direction::Outgoing)
            .filter(|next| members.contains(next))
            .collect();
        successors.sort();

        for next in successors {
            if next == start {
                let mut middle = Vec::new();
                let mut cursor = current;
                while cursor != start {
                    middle.push(cursor);
                    cursor = parent[&cursor];
                }
                middle.reverse();

                let mut path = Vec::with_capacity(middle.len() + 2);
                path.push(start);
                path.extend(middle);
                path.push(start);
                return path;
            }
            if seen.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    vec![start]
}

/// Kahn's algorithm over "depends on" edges, emitting modules whose
/// dependencies are all emitted. A min-heap keeps ties in name order.
fn dependency_first_order(
    modules: &IndexMap<String, ModuleDescriptor>,
    graph: &DiGraph<(), DependencyScope>,
) -> Result<Vec<String>> {
    let mut pending: Vec<usize> = graph
        .node_indices()
        .map(|index| {
            graph
                .neighbors_directed(index, Direction::Outgoing)
                .collect::<IndexSet<_>>()
                .len()
        })
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(modules.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(modules.get_index(index).map(|(name, _)| name.clone()).unwrap_or_default());
        let dependents: IndexSet<NodeIndex> = graph
            .neighbors_directed(NodeIndex::new(index), Direction::Incoming)
            .collect();
        for dependent in dependents {
            let count = &mut pending[dependent.index()];
            *count -= 1;
            if *count == 0 {
                ready.push(Reverse(dependent.index()));
            }
        }
    }

    if order.len() != modules.len() {
        return Err(Error::invariant_violation(format!(
            "ordered {} of {} modules after removing allowed cycles",
            order.len(),
            modules.len()
        ))
        .with_operation("graph::build_order"));
    }
    Ok(order)
}
