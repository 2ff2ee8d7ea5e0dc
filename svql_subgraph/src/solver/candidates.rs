//! Static per-node candidate lists.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::{NodeComparator, PortMap, Prepared};
use crate::graph::{Node, NodeId, PinBit};
use crate::registry::{permuted, PortPermutation, Registry};

/// A haystack node a needle node may map to, under one port assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Candidate {
    pub haystack: NodeId,
    /// Haystack port id for each needle port id.
    pub port_map: Vec<usize>,
}

/// Candidates for every needle node, in haystack node order.
pub(super) fn build<U, C>(
    registry: &Registry,
    comparator: &C,
    needle: &Prepared<U>,
    haystack: &Prepared<U>,
) -> Vec<Vec<Candidate>>
where
    C: NodeComparator<U>,
{
    let mut perm_cache: HashMap<&str, Vec<PortPermutation>> = HashMap::new();

    needle
        .graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(n, n_node)| {
            let perms = perm_cache
                .entry(n_node.ty.as_str())
                .or_insert_with(|| registry.permutations(&n_node.ty));

            let mut out = Vec::new();
            for (h, h_node) in haystack.graph.nodes().iter().enumerate() {
                if !registry.types_compatible(&n_node.ty, &h_node.ty) {
                    continue;
                }
                let mut seen: HashSet<Vec<usize>> = HashSet::new();
                for perm in perms.iter() {
                    let Some(port_map) = map_ports(n_node, h_node, perm) else {
                        continue;
                    };
                    if !seen.insert(port_map.clone()) {
                        continue;
                    }
                    if !pins_compatible(needle, haystack, n, h, &port_map) {
                        continue;
                    }
                    let names = port_names(n_node, h_node, &port_map);
                    if !comparator.compatible(n_node.user_data.as_ref(), h_node.user_data.as_ref(), &names) {
                        continue;
                    }
                    out.push(Candidate {
                        haystack: h,
                        port_map,
                    });
                }
            }
            trace!("{}: {} candidate(s)", n_node.name, out.len());
            out
        })
        .collect()
}

/// Haystack port ids for the needle ports renamed by `perm`, if every renamed
/// port exists with the same width.
fn map_ports<U>(needle: &Node<U>, haystack: &Node<U>, perm: &PortPermutation) -> Option<Vec<usize>> {
    needle
        .ports()
        .iter()
        .map(|port| {
            let h = haystack.port_id(permuted(perm, &port.name))?;
            (haystack.ports()[h].width == port.width).then_some(h)
        })
        .collect()
}

/// Per-bit net checks that do not depend on the rest of the assignment.
fn pins_compatible<U>(
    needle: &Prepared<U>,
    haystack: &Prepared<U>,
    n: NodeId,
    h: NodeId,
    port_map: &[usize],
) -> bool {
    let n_node = needle.graph.node(n);
    for (p, port) in n_node.ports().iter().enumerate() {
        for bit in 0..port.width {
            let n_net = needle.nets.net(needle.nets.net_of(PinBit::new(n, p, bit)));
            let h_net = haystack
                .nets
                .net(haystack.nets.net_of(PinBit::new(h, port_map[p], bit)));

            if n_net.pins.len() < 2 {
                if n_net.constant.is_some() && n_net.constant != h_net.constant {
                    return false;
                }
                continue;
            }
            if n_net.constant != h_net.constant || h_net.pins.len() < n_net.pins.len() {
                return false;
            }
            if !n_net.is_extern && h_net.pins.len() != n_net.pins.len() {
                return false;
            }
        }
    }
    true
}

/// Port name map for a candidate's port assignment.
pub(super) fn port_names<U>(needle: &Node<U>, haystack: &Node<U>, port_map: &[usize]) -> PortMap {
    needle
        .ports()
        .iter()
        .zip(port_map)
        .map(|(port, &h)| (port.name.clone(), haystack.ports()[h].name.clone()))
        .collect()
}
