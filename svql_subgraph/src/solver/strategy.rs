//! Needle node ordering for the search.

use super::candidates::Candidate;
use super::Prepared;
use crate::graph::NodeId;

/// Order in which needle nodes are assigned.
///
/// Starts at the node with the fewest candidates, then repeatedly takes the
/// most constrained node sharing a net with an already ordered node. Ties go
/// to the lower node id; disconnected parts restart from the global minimum.
pub(super) fn search_order<U>(needle: &Prepared<U>, cands: &[Vec<Candidate>]) -> Vec<NodeId> {
    let count = needle.graph.node_count();
    let mut placed = vec![false; count];
    let mut adjacent = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while order.len() < count {
        let pick = |want_adjacent: bool| {
            (0..count)
                .filter(|&n| !placed[n] && (!want_adjacent || adjacent[n]))
                .min_by_key(|&n| (cands[n].len(), n))
        };
        let Some(next) = pick(true).or_else(|| pick(false)) else {
            break;
        };

        placed[next] = true;
        order.push(next);
        for &net in &needle.node_nets[next] {
            for &m in &needle.net_nodes[net] {
                adjacent[m] = true;
            }
        }
    }
    order
}
