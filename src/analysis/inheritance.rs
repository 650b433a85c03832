// Inheritance and implementation maps
//
// Both are snapshots built once per scan. Cycles in the declared hierarchy are
// tolerated: closure iterations are bounded by the number of types.

use crate::graph::{Declaration, DeclarationKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Type name to the transitive set of its supertypes
#[derive(Debug, Default)]
pub struct InheritanceMap {
    /// child -> parent edges
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    ancestors: HashMap<String, BTreeSet<String>>,
}

impl InheritanceMap {
    pub fn build<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> Self {
        let mut map = Self::default();
        for decl in declarations {
            if !decl.kind.is_inheritable() || decl.parent.is_some() {
                continue;
            }
            let child = map.node(&decl.name);
            for parent in decl.super_types() {
                if parent == &decl.name {
                    continue;
                }
                let parent = map.node(parent);
                map.graph.update_edge(child, parent, ());
            }
        }
        map.close();
        map
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Fixed-point closure of the direct-parent relation
    fn close(&mut self) {
        let mut ancestors: HashMap<NodeIndex, BTreeSet<NodeIndex>> = self
            .graph
            .node_indices()
            .map(|n| {
                (
                    n,
                    self.graph
                        .neighbors_directed(n, Direction::Outgoing)
                        .collect(),
                )
            })
            .collect();

        let bound = self.graph.node_count().max(1);
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for node in self.graph.node_indices() {
                let current = &ancestors[&node];
                let mut next = current.clone();
                for parent in current {
                    if let Some(grand) = ancestors.get(parent) {
                        next.extend(grand.iter().copied());
                    }
                }
                next.remove(&node);
                if next.len() != current.len() {
                    ancestors.insert(node, next);
                    changed = true;
                }
            }
            if !changed || rounds >= bound {
                break;
            }
        }
        debug!(
            "Inheritance closure over {} types converged after {} rounds",
            self.graph.node_count(),
            rounds
        );

        self.ancestors = ancestors
            .into_iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(node, set)| {
                (
                    self.graph[node].clone(),
                    set.into_iter().map(|a| self.graph[a].clone()).collect(),
                )
            })
            .collect();
    }

    /// All direct and indirect supertypes of `name`
    pub fn ancestors(&self, name: &str) -> impl Iterator<Item = &String> {
        self.ancestors.get(name).into_iter().flatten()
    }

    pub fn is_ancestor(&self, child: &str, ancestor: &str) -> bool {
        self.ancestors
            .get(child)
            .map(|set| set.contains(ancestor))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

/// "Base.m" to the "Impl.m" members overriding it, and back
#[derive(Debug, Default)]
pub struct ImplementationMap {
    implementations: HashMap<String, BTreeSet<String>>,
    bases: HashMap<String, BTreeSet<String>>,
}

impl ImplementationMap {
    pub fn build<'a>(
        declarations: impl IntoIterator<Item = &'a Declaration>,
        inheritance: &InheritanceMap,
    ) -> Self {
        let mut members: HashMap<&str, HashSet<&str>> = HashMap::new();
        for decl in declarations {
            let overridable = decl.kind.is_method_like() || decl.kind == DeclarationKind::Field;
            if !overridable || decl.is_static {
                continue;
            }
            if let Some(parent) = &decl.parent {
                members
                    .entry(parent.as_str())
                    .or_default()
                    .insert(decl.name.as_str());
            }
        }

        let mut map = Self::default();
        for (owner, names) in &members {
            for ancestor in inheritance.ancestors(owner) {
                let Some(base_members) = members.get(ancestor.as_str()) else {
                    continue;
                };
                for name in names.intersection(base_members) {
                    let base = format!("{}.{}", ancestor, name);
                    let implementation = format!("{}.{}", owner, name);
                    map.implementations
                        .entry(base.clone())
                        .or_default()
                        .insert(implementation.clone());
                    map.bases.entry(implementation).or_default().insert(base);
                }
            }
        }
        debug!(
            "Implementation map: {} overridden members",
            map.implementations.len()
        );
        map
    }

    /// Members overriding `key` ("Owner.name")
    pub fn implementations_of(&self, key: &str) -> impl Iterator<Item = &String> {
        self.implementations.get(key).into_iter().flatten()
    }

    /// Members `key` overrides
    pub fn bases_of(&self, key: &str) -> impl Iterator<Item = &String> {
        self.bases.get(key).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}
