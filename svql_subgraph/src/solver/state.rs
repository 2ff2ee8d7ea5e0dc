//! Mutable search state with an undo log.

use super::candidates::Candidate;
use super::Prepared;
use crate::graph::{NetId, NodeId, PinBit};

#[derive(Debug)]
pub(super) struct State {
    /// Chosen candidate index per needle node.
    assigned: Vec<Option<usize>>,
    used: Vec<bool>,
    /// Needle net to haystack net, for multi-pin needle nets.
    net_fwd: Vec<Option<NetId>>,
    /// Haystack net to needle net.
    net_rev: Vec<Option<NetId>>,
    /// Needle nets bound since the search started, most recent last.
    undo: Vec<NetId>,
}

impl State {
    pub fn new<U>(needle: &Prepared<U>, haystack: &Prepared<U>) -> Self {
        Self {
            assigned: vec![None; needle.graph.node_count()],
            used: vec![false; haystack.graph.node_count()],
            net_fwd: vec![None; needle.nets.nets.len()],
            net_rev: vec![None; haystack.nets.nets.len()],
            undo: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_used(&self, h: NodeId) -> bool {
        self.used[h]
    }

    #[must_use]
    pub fn bound(&self, n_net: NetId) -> Option<NetId> {
        self.net_fwd[n_net]
    }

    /// Chosen candidate index per needle node, once every node is assigned.
    pub fn assignment(&self) -> Option<Vec<usize>> {
        self.assigned.iter().copied().collect()
    }

    /// Assign needle node `n` to `cand`. On conflict nothing is changed and
    /// `false` is returned.
    pub fn assign<U>(
        &mut self,
        needle: &Prepared<U>,
        haystack: &Prepared<U>,
        n: NodeId,
        index: usize,
        cand: &Candidate,
    ) -> bool {
        if self.used[cand.haystack] {
            return false;
        }
        let mark = self.undo.len();
        let n_node = needle.graph.node(n);

        for (p, port) in n_node.ports().iter().enumerate() {
            for bit in 0..port.width {
                let n_net = needle.nets.net_of(PinBit::new(n, p, bit));
                if needle.nets.net(n_net).pins.len() < 2 {
                    continue;
                }
                let h_net = haystack
                    .nets
                    .net_of(PinBit::new(cand.haystack, cand.port_map[p], bit));

                let ok = match (self.net_fwd[n_net], self.net_rev[h_net]) {
                    (Some(f), _) => f == h_net,
                    (None, None) => {
                        self.net_fwd[n_net] = Some(h_net);
                        self.net_rev[h_net] = Some(n_net);
                        self.undo.push(n_net);
                        true
                    },
                    (None, Some(_)) => false,
                };
                if !ok {
                    self.rollback(mark);
                    return false;
                }
            }
        }

        self.assigned[n] = Some(index);
        self.used[cand.haystack] = true;
        true
    }

    /// Take back the assignment of `n` and every net it bound.
    pub fn unassign(&mut self, n: NodeId, cand: &Candidate, mark: usize) {
        self.assigned[n] = None;
        self.used[cand.haystack] = false;
        self.rollback(mark);
    }

    /// Current undo log position.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.undo.len()
    }

    fn rollback(&mut self, mark: usize) {
        while self.undo.len() > mark {
            if let Some(n_net) = self.undo.pop() {
                if let Some(h_net) = self.net_fwd[n_net].take() {
                    self.net_rev[h_net] = None;
                }
            }
        }
    }
}
