//! Per-context module graph construction.
//!
//! The graph builder takes the immutable declaration store plus one build
//! context and produces the concrete dependency graph for that context:
//! unconditional edges first, then each conditional rule in declaration
//! order, with remove rules deleting previously-accumulated edges (last
//! writer wins per edge). Dynamically-loaded dependencies are kept on a
//! side list and never become edges, so they cannot create cycles.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::core::context::BuildContext;
use crate::core::declaration::Visibility;
use crate::core::store::DeclarationStore;
use crate::resolver::errors::ResolveError;
use crate::util::Name;

/// The dependency graph for one build context.
///
/// Nodes exist for every name referenced anywhere, declared or not;
/// `is_declared` distinguishes the two so the resolver can report missing
/// modules with the requiring edge.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    context: BuildContext,
    graph: DiGraph<Name, Visibility>,
    node_of: HashMap<Name, NodeIndex>,
    declared: HashSet<Name>,
    dynamic: HashMap<Name, Vec<Name>>,
}

impl ModuleGraph {
    /// Build the graph for a context.
    ///
    /// Fails with `UnknownPredicate` if any module rule contains an
    /// unrecognized primitive; this is the early rejection point for
    /// malformed declarations.
    pub fn build(store: &DeclarationStore, context: &BuildContext) -> Result<Self, ResolveError> {
        let mut graph = ModuleGraph {
            context: context.clone(),
            graph: DiGraph::new(),
            node_of: HashMap::new(),
            declared: HashSet::new(),
            dynamic: HashMap::new(),
        };

        for module in store.modules() {
            graph.declared.insert(module.name);
            graph.ensure_node(module.name);

            // Accumulate the edge list for this module: base edges, then
            // rules in declaration order.
            let mut edges: Vec<(Name, Visibility)> = Vec::new();
            edges.extend(module.public_deps.iter().map(|&d| (d, Visibility::Public)));
            edges.extend(module.private_deps.iter().map(|&d| (d, Visibility::Private)));

            for rule in &module.rules {
                if let Err(primitive) = rule.when.validate() {
                    return Err(ResolveError::UnknownPredicate {
                        primitive,
                        declared_by: module.name,
                        context: context.clone(),
                    });
                }
                if !rule.when.evaluate(context) {
                    continue;
                }
                tracing::debug!(
                    "module `{}`: rule `{}` applies under {}",
                    module.name,
                    rule.when,
                    context
                );
                for &removed in &rule.remove {
                    // Removing an edge that was never added is a no-op;
                    // declarations are often written defensively.
                    edges.retain(|(dep, _)| *dep != removed);
                }
                edges.extend(rule.add.iter().map(|&d| (d, rule.visibility)));
            }

            for (dep, visibility) in dedupe_edges(edges) {
                let from = graph.ensure_node(module.name);
                let to = graph.ensure_node(dep);
                graph.graph.add_edge(from, to, visibility);
            }

            if !module.dynamic_deps.is_empty() {
                graph.dynamic.insert(module.name, module.dynamic_deps.clone());
            }
        }

        Ok(graph)
    }

    fn ensure_node(&mut self, name: Name) -> NodeIndex {
        match self.node_of.get(&name) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(name);
                self.node_of.insert(name, idx);
                idx
            }
        }
    }

    /// The context this graph was built for.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Whether a declaration exists for this name.
    pub fn is_declared(&self, name: Name) -> bool {
        self.declared.contains(&name)
    }

    /// Direct dependencies of a module, in declaration order.
    pub fn deps(&self, name: Name) -> Vec<(Name, Visibility)> {
        let Some(&node) = self.node_of.get(&name) else {
            return Vec::new();
        };
        // petgraph iterates outgoing edges most-recent-first; reverse to
        // recover declaration order.
        let mut deps: Vec<(Name, Visibility)> = self
            .graph
            .edges(node)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        deps.reverse();
        deps
    }

    /// Modules that depend on the given module.
    pub fn dependents(&self, name: Name) -> Vec<Name> {
        let Some(&node) = self.node_of.get(&name) else {
            return Vec::new();
        };
        let mut result: Vec<Name> = self
            .graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        result.reverse();
        result
    }

    /// Dynamically-loaded references of a module (side list, never edges).
    pub fn dynamic_deps(&self, name: Name) -> &[Name] {
        self.dynamic.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declared modules.
    pub fn module_count(&self) -> usize {
        self.declared.len()
    }
}

/// Collapse duplicate edges to the same dependency, keeping the first
/// occurrence's position. Public wins over private when both were declared.
fn dedupe_edges(edges: Vec<(Name, Visibility)>) -> Vec<(Name, Visibility)> {
    let mut seen: HashMap<Name, usize> = HashMap::new();
    let mut result: Vec<(Name, Visibility)> = Vec::new();
    for (dep, visibility) in edges {
        match seen.get(&dep) {
            Some(&i) => {
                if visibility == Visibility::Public {
                    result[i].1 = Visibility::Public;
                }
            }
            None => {
                seen.insert(dep, result.len());
                result.push((dep, visibility));
            }
        }
    }
    result
}
