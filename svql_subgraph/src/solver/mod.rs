//! Backtracking subgraph isomorphism search.
//!
//! Graphs are registered under an id and frozen into a net view. A search maps
//! every needle node onto a distinct haystack node such that
//!
//! * the node types are equal or registered as compatible,
//! * each needle port, renamed by one of the allowed port permutations, exists
//!   on the haystack node with the same width,
//! * every needle net with two or more pins lands on a single haystack net, and
//!   distinct needle nets land on distinct haystack nets,
//! * a needle net that is not extern lands on a haystack net with exactly as
//!   many pins, so no internal signal of the needle leaks in the haystack,
//! * inline constants agree, and
//! * the [`NodeComparator`] accepts the pair.

mod candidates;
mod search;
mod state;
mod strategy;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::graph::{Graph, NetId, NetTable, NodeId};
use crate::registry::Registry;

/// Needle port name to haystack port name for one node pair.
pub type PortMap = BTreeMap<String, String>;

/// Pluggable node-pair predicate consulted for every candidate pair.
///
/// Either side may lack user data (synthetic nodes such as constant drivers).
pub trait NodeComparator<U> {
    /// Whether the needle node may map onto the haystack node under `port_map`.
    fn compatible(&self, needle: Option<&U>, haystack: Option<&U>, port_map: &PortMap) -> bool;
}

/// Accepts every pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<U> NodeComparator<U> for AcceptAll {
    fn compatible(&self, _: Option<&U>, _: Option<&U>, _: &PortMap) -> bool {
        true
    }
}

impl<U, F> NodeComparator<U> for F
where
    F: Fn(Option<&U>, Option<&U>, &PortMap) -> bool,
{
    fn compatible(&self, needle: Option<&U>, haystack: Option<&U>, port_map: &PortMap) -> bool {
        self(needle, haystack, port_map)
    }
}

/// Registration and configuration failures. An empty search is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// `add_graph` was given an id already in use.
    #[error("a graph with id {0} is already registered")]
    DuplicateGraph(String),
    /// A search named a graph id that was never registered.
    #[error("no graph with id {0} is registered")]
    UnknownGraph(String),
    /// The two sides of a port permutation are not the same port set.
    #[error("invalid port permutation for {type_name}: {reason}")]
    InvalidPermutation {
        /// Cell type the permutation was declared for.
        type_name: String,
        /// What is wrong with the two port lists.
        reason: String,
    },
}

/// Per-search limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Stop after this many results per needle/haystack pair. `Some(0)`
    /// skips the search.
    pub max_solutions: Option<usize>,
}

/// Where one needle node landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMapping<U> {
    pub needle_node: String,
    pub haystack_node: String,
    pub needle_user_data: Option<U>,
    pub haystack_user_data: Option<U>,
    /// Needle port name to the haystack port it was matched with.
    pub port_mapping: PortMap,
}

/// One embedding of a needle graph in a haystack graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveResult<U> {
    pub needle_graph_id: String,
    pub haystack_graph_id: String,
    /// Keyed by needle node name, in needle node order.
    pub mappings: IndexMap<String, NodeMapping<U>>,
}

/// A registered graph together with its frozen net view.
#[derive(Debug)]
pub(crate) struct Prepared<U> {
    pub(crate) graph: Graph<U>,
    pub(crate) nets: NetTable,
    /// Nodes with a pin on each net, sorted.
    pub(crate) net_nodes: Vec<Vec<NodeId>>,
    /// Multi-pin nets touching each node, sorted.
    pub(crate) node_nets: Vec<Vec<NetId>>,
}

impl<U> Prepared<U> {
    fn new(graph: Graph<U>) -> Self {
        let nets = graph.net_table();
        let mut net_nodes: Vec<Vec<NodeId>> = nets
            .nets
            .iter()
            .map(|net| net.pins.iter().map(|p| p.node).collect())
            .collect();
        let mut node_nets: Vec<Vec<NetId>> = vec![Vec::new(); graph.node_count()];
        for (id, net) in nets.nets.iter().enumerate() {
            if net.pins.len() < 2 {
                continue;
            }
            for pin in &net.pins {
                node_nets[pin.node].push(id);
            }
        }
        for list in net_nodes.iter_mut().chain(node_nets.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        Self {
            graph,
            nets,
            net_nodes,
            node_nets,
        }
    }
}

/// Graph registry plus search entry points.
pub struct Solver<U, C> {
    comparator: C,
    registry: Registry,
    graphs: IndexMap<String, Prepared<U>>,
}

impl<U, C> Solver<U, C>
where
    U: Clone,
    C: NodeComparator<U>,
{
    pub fn new(comparator: C) -> Self {
        Self {
            comparator,
            registry: Registry::new(),
            graphs: IndexMap::new(),
        }
    }

    pub fn with_registry(comparator: C, registry: Registry) -> Self {
        Self {
            comparator,
            registry,
            graphs: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    #[must_use]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn add_compatible_types(&mut self, needle_type: &str, haystack_type: &str) {
        self.registry.add_compatible_types(needle_type, haystack_type);
    }

    pub fn add_swappable_ports<S: AsRef<str>>(&mut self, ty: &str, ports: impl IntoIterator<Item = S>) {
        self.registry.add_swappable_ports(ty, ports);
    }

    pub fn add_swappable_ports_permutation<S: AsRef<str>>(
        &mut self,
        ty: &str,
        left: &[S],
        right: &[S],
    ) -> Result<(), SolverError> {
        self.registry.add_swappable_ports_permutation(ty, left, right)
    }

    /// Register a graph. The graph is frozen from here on.
    pub fn add_graph(&mut self, id: &str, graph: Graph<U>) -> Result<(), SolverError> {
        if self.graphs.contains_key(id) {
            return Err(SolverError::DuplicateGraph(id.to_string()));
        }
        debug!(
            "registering graph {} ({} nodes)",
            id,
            graph.node_count()
        );
        self.graphs.insert(id.to_string(), Prepared::new(graph));
        Ok(())
    }

    #[must_use]
    pub fn graph(&self, id: &str) -> Option<&Graph<U>> {
        self.graphs.get(id).map(|p| &p.graph)
    }

    /// Registered graph ids, in registration order.
    pub fn graph_ids(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    fn prepared(&self, id: &str) -> Result<&Prepared<U>, SolverError> {
        self.graphs
            .get(id)
            .ok_or_else(|| SolverError::UnknownGraph(id.to_string()))
    }

    /// Find every embedding of `needle_id` in `haystack_id`.
    pub fn solve(
        &self,
        needle_id: &str,
        haystack_id: &str,
        options: &SolveOptions,
    ) -> Result<Vec<SolveResult<U>>, SolverError> {
        let needle = self.prepared(needle_id)?;
        let haystack = self.prepared(haystack_id)?;

        let cands = candidates::build(&self.registry, &self.comparator, needle, haystack);
        let found = search::run(needle, haystack, &cands, options);
        debug!(
            "{} in {}: {} result(s)",
            needle_id,
            haystack_id,
            found.len()
        );

        Ok(found
            .into_iter()
            .map(|assignment| {
                let mappings = assignment
                    .iter()
                    .enumerate()
                    .map(|(n, &c)| {
                        let cand = &cands[n][c];
                        let n_node = needle.graph.node(n);
                        let h_node = haystack.graph.node(cand.haystack);
                        let mapping = NodeMapping {
                            needle_node: n_node.name.clone(),
                            haystack_node: h_node.name.clone(),
                            needle_user_data: n_node.user_data.clone(),
                            haystack_user_data: h_node.user_data.clone(),
                            port_mapping: candidates::port_names(n_node, h_node, &cand.port_map),
                        };
                        (n_node.name.clone(), mapping)
                    })
                    .collect();
                SolveResult {
                    needle_graph_id: needle_id.to_string(),
                    haystack_graph_id: haystack_id.to_string(),
                    mappings,
                }
            })
            .collect())
    }
}

impl<U, C> Solver<U, C>
where
    U: Clone + Send + Sync,
    C: NodeComparator<U> + Sync,
{
    /// Search every haystack in turn. Results are concatenated in the order
    /// of `haystack_ids`, also when the searches run in parallel.
    pub fn solve_all<S: AsRef<str> + Sync>(
        &self,
        needle_id: &str,
        haystack_ids: &[S],
        options: &SolveOptions,
    ) -> Result<Vec<SolveResult<U>>, SolverError> {
        #[cfg(feature = "rayon")]
        let per_haystack: Vec<Result<Vec<SolveResult<U>>, SolverError>> = haystack_ids
            .par_iter()
            .map(|h| self.solve(needle_id, h.as_ref(), options))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let per_haystack: Vec<Result<Vec<SolveResult<U>>, SolverError>> = haystack_ids
            .iter()
            .map(|h| self.solve(needle_id, h.as_ref(), options))
            .collect();

        let mut out = Vec::new();
        for results in per_haystack {
            out.extend(results?);
        }
        Ok(out)
    }
}
