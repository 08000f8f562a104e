//! Dependency graph module.
//!
//! Provides the `StatGraph` type, which represents stat dependencies
//! as a directed acyclic graph (DAG). Used by the resolver to determine
//! the correct order for stat resolution.

use crate::error::SheetError;
use crate::stat_id::StatId;
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// A directed acyclic graph (DAG) representing stat dependencies.
///
/// Nodes are `StatId`s, edges represent dependencies. If stat A depends
/// on stat B, then B must be resolved before A.
///
/// # Examples
///
/// ```rust
/// use charstat::graph::StatGraph;
/// use charstat::{Ability, StatId};
///
/// let mut graph = StatGraph::new();
/// let dex = StatId::modifier(Ability::Dexterity);
/// let ac = StatId::armor_class();
///
/// // AC depends on the DEX modifier
/// graph.add_edge(ac.clone(), dex.clone());
///
/// let order = graph.topological_sort().unwrap();
/// assert_eq!(order, vec![dex, ac]);
/// ```
pub struct StatGraph {
    graph: DiGraph<StatId, ()>,
    node_map: HashMap<StatId, NodeIndex>,
}

impl StatGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a node to the graph if it doesn't exist, returning its index.
    pub fn add_node(&mut self, stat_id: StatId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&stat_id) {
            idx
        } else {
            let idx = self.graph.add_node(stat_id.clone());
            self.node_map.insert(stat_id, idx);
            idx
        }
    }

    /// Add an edge representing a dependency.
    ///
    /// `from` depends on `to` (to must be resolved before from).
    /// Both nodes are automatically added to the graph if they don't exist.
    pub fn add_edge(&mut self, from: StatId, to: StatId) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.graph.add_edge(to_idx, from_idx, ());
    }

    /// Get a topological sort of all nodes.
    ///
    /// Dependencies are guaranteed to come before dependents. Nodes are
    /// visited in insertion order, so the same registrations always produce
    /// the same order.
    ///
    /// # Errors
    ///
    /// `SheetError::Cycle` with a closed path (`[a, b, a]`) through the
    /// offending stats, reading "a depends on b depends on a".
    pub fn topological_sort(&self) -> Result<Vec<StatId>, SheetError> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(SheetError::Cycle {
                path: self.cycle_through(cycle.node_id()),
            }),
        }
    }

    /// Reconstruct a closed dependency path through `start`.
    fn cycle_through(&self, start: NodeIndex) -> Vec<StatId> {
        let component: HashSet<NodeIndex> = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .map(|scc| scc.into_iter().collect())
            .unwrap_or_default();

        // Walk dependent -> dependency (incoming edges) until we return to start.
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);

        while let Some(node) = queue.pop_front() {
            let mut deps: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .filter(|n| component.contains(n))
                .collect();
            deps.sort();

            for dep in deps {
                if dep == start {
                    let mut path = vec![self.graph[start].clone()];
                    let mut chain = vec![node];
                    let mut cursor = node;
                    while let Some(&prev) = parent.get(&cursor) {
                        chain.push(prev);
                        cursor = prev;
                    }
                    // chain runs node -> ... -> start; drop start and reverse
                    chain.pop();
                    path.extend(chain.into_iter().rev().map(|idx| self.graph[idx].clone()));
                    path.push(self.graph[start].clone());
                    return path;
                }
                if seen.insert(dep) {
                    parent.insert(dep, node);
                    queue.push_back(dep);
                }
            }
        }

        vec![self.graph[start].clone(), self.graph[start].clone()]
    }

    /// Extract a subgraph containing only `targets` and their transitive
    /// dependencies.
    pub fn subgraph_for_targets(&self, targets: &[StatId]) -> StatGraph {
        let mut subgraph = StatGraph::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<StatId> = targets.to_vec();

        while let Some(stat_id) = stack.pop() {
            if !visited.insert(stat_id.clone()) {
                continue;
            }
            let Some(&node_idx) = self.node_map.get(&stat_id) else {
                continue;
            };
            subgraph.add_node(stat_id.clone());

            for dep_idx in self.graph.neighbors_directed(node_idx, Direction::Incoming) {
                let dep = self.graph[dep_idx].clone();
                if !visited.contains(&dep) {
                    stack.push(dep.clone());
                }
                subgraph.add_edge(stat_id.clone(), dep);
            }
        }

        subgraph
    }
}

impl Default for StatGraph {
    fn default() -> Self {
        Self::new()
    }
}
