//! Depth-first assignment over an explicit frame stack.

use std::collections::HashSet;

use tracing::trace;

use super::candidates::Candidate;
use super::state::State;
use super::strategy::search_order;
use super::{Prepared, SolveOptions};
use crate::graph::{NodeId, PinBit};

struct Frame {
    node: NodeId,
    /// Candidate indices still to try, narrowed through already bound nets.
    options: Vec<usize>,
    next: usize,
    /// Candidate currently assigned and the undo mark taken before it.
    active: Option<(usize, usize)>,
}

/// Run the search and return the candidate index chosen for every needle
/// node, one entry per distinct node mapping.
pub(super) fn run<U>(
    needle: &Prepared<U>,
    haystack: &Prepared<U>,
    cands: &[Vec<Candidate>],
    options: &SolveOptions,
) -> Vec<Vec<usize>> {
    let mut results = Vec::new();
    if options.max_solutions == Some(0) {
        return results;
    }
    if needle.graph.node_count() == 0 || cands.iter().any(Vec::is_empty) {
        return results;
    }

    let order = search_order(needle, cands);
    let mut state = State::new(needle, haystack);
    let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
    let mut stack = vec![frame(needle, haystack, cands, &state, order[0])];

    while let Some(top) = stack.last_mut() {
        if let Some((c, mark)) = top.active.take() {
            state.unassign(top.node, &cands[top.node][c], mark);
        }

        let Some(&c) = top.options.get(top.next) else {
            stack.pop();
            continue;
        };
        top.next += 1;

        let node = top.node;
        let cand = &cands[node][c];
        let mark = state.mark();
        if !state.assign(needle, haystack, node, c, cand) {
            continue;
        }
        top.active = Some((c, mark));

        let depth = stack.len();
        if depth < order.len() {
            stack.push(frame(needle, haystack, cands, &state, order[depth]));
            continue;
        }

        let Some(assignment) = state.assignment() else {
            continue;
        };
        let signature: Vec<NodeId> = assignment
            .iter()
            .enumerate()
            .map(|(n, &c)| cands[n][c].haystack)
            .collect();
        if seen.insert(signature) {
            trace!("solution {}", results.len());
            results.push(assignment);
            if options.max_solutions.is_some_and(|max| results.len() >= max) {
                break;
            }
        }
    }
    results
}

/// Candidates for `node` consistent with the nets bound so far.
fn frame<U>(
    needle: &Prepared<U>,
    haystack: &Prepared<U>,
    cands: &[Vec<Candidate>],
    state: &State,
    node: NodeId,
) -> Frame {
    let anchor = needle.node_nets[node]
        .iter()
        .find_map(|&net| state.bound(net));

    let options = cands[node]
        .iter()
        .enumerate()
        .filter(|(_, cand)| !state.is_used(cand.haystack))
        .filter(|(_, cand)| anchor.is_none_or(|h_net| haystack.net_nodes[h_net].binary_search(&cand.haystack).is_ok()))
        .filter(|(_, cand)| bound_nets_agree(needle, haystack, state, node, cand))
        .map(|(i, _)| i)
        .collect();

    Frame {
        node,
        options,
        next: 0,
        active: None,
    }
}

/// Cheap pre-check of the nets `assign` would verify.
fn bound_nets_agree<U>(
    needle: &Prepared<U>,
    haystack: &Prepared<U>,
    state: &State,
    node: NodeId,
    cand: &Candidate,
) -> bool {
    let n_node = needle.graph.node(node);
    n_node.ports().iter().enumerate().all(|(p, port)| {
        (0..port.width).all(|bit| {
            let n_net = needle.nets.net_of(PinBit::new(node, p, bit));
            state.bound(n_net).is_none_or(|h_net| {
                haystack
                    .nets
                    .net_of(PinBit::new(cand.haystack, cand.port_map[p], bit))
                    == h_net
            })
        })
    })
}
