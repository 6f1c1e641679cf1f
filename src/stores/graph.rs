//! Binding dependency graph
//!
//! Edges run from a required binding to the binding that requires it, so a
//! topological sort yields a valid resolution order.

use crate::error::ConfigurationError;
use crate::stores::binding::Binding;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Validated shape of a set of bindings
#[derive(Debug, Default)]
pub struct BindingGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl BindingGraph {
    /// Build the graph, rejecting duplicate namespaces and unknown requirements
    pub fn build<'a>(
        bindings: impl IntoIterator<Item = &'a Binding>,
    ) -> Result<Self, ConfigurationError> {
        let bindings: Vec<&Binding> = bindings.into_iter().collect();
        let mut graph = Self::default();

        for binding in &bindings {
            let namespace = binding.namespace().to_string();
            if graph.index.contains_key(&namespace) {
                return Err(ConfigurationError::DuplicateBinding(namespace));
            }
            let node = graph.graph.add_node(namespace.clone());
            graph.index.insert(namespace, node);
        }

        for binding in &bindings {
            let dependent = graph.index[binding.namespace()];
            for required in binding.requires() {
                let upstream = graph.index.get(required.as_str()).copied().ok_or_else(|| {
                    ConfigurationError::UnresolvedBinding {
                        namespace: binding.namespace().to_string(),
                        missing: required.clone(),
                    }
                })?;
                graph.graph.add_edge(upstream, dependent, ());
            }
        }

        Ok(graph)
    }

    /// Namespaces with every requirement before its dependents
    pub fn resolution_order(&self) -> Result<Vec<String>, ConfigurationError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|node| self.graph[node].clone())
                .collect()),
            Err(cycle) => Err(ConfigurationError::CyclicBinding {
                cycle: self.cycle_through(cycle.node_id()),
            }),
        }
    }

    /// Namespaces nothing else requires
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self
            .graph
            .node_indices()
            .filter(|n| {
                self.graph
                    .neighbors_directed(*n, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|n| self.graph[n].as_str())
            .collect();
        roots.sort_unstable();
        roots
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // Walk "requires" edges inside the strongly connected component of
    // `start` until a namespace repeats. Result reads as
    // `a -> b -> a` meaning a requires b requires a.
    fn cycle_through(&self, start: NodeIndex) -> Vec<String> {
        let cyclic: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .collect();

        // Prefer the component holding the reported node, else any cycle
        let members = cyclic
            .iter()
            .find(|scc| scc.contains(&start))
            .or_else(|| cyclic.first())
            .cloned()
            .unwrap_or_else(|| vec![start]);

        let start = if members.contains(&start) {
            start
        } else {
            members.iter().copied().min_by_key(|n| n.index()).unwrap_or(start)
        };
        let component: HashSet<NodeIndex> = members.into_iter().collect();

        let mut path = vec![start];
        let mut current = start;
        for _ in 0..=component.len() {
            let next = self
                .graph
                .neighbors_directed(current, Direction::Incoming)
                .filter(|n| component.contains(n))
                .min_by_key(|n| n.index());

            let Some(next) = next else { break };
            if let Some(pos) = path.iter().position(|n| *n == next) {
                path.push(next);
                path.drain(..pos);
                break;
            }
            path.push(next);
            current = next;
        }

        path.into_iter().map(|n| self.graph[n].clone()).collect()
    }
}
