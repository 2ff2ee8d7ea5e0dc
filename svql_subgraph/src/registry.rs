//! Type compatibility and port equivalence tables.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use itertools::Itertools;

use crate::solver::SolverError;

/// Port renaming applied to a needle node before its ports are looked up on a
/// haystack node. Ports that map to themselves are not stored.
pub type PortPermutation = BTreeMap<String, String>;

/// Operand swaps registered unless default swaps are disabled.
pub const DEFAULT_SWAP_PORTS: &[(&str, &[&str])] = &[
    ("$and", &["A", "B"]),
    ("$or", &["A", "B"]),
    ("$xor", &["A", "B"]),
    ("$xnor", &["A", "B"]),
    ("$eq", &["A", "B"]),
    ("$ne", &["A", "B"]),
    ("$eqx", &["A", "B"]),
    ("$nex", &["A", "B"]),
    ("$add", &["A", "B"]),
    ("$mul", &["A", "B"]),
    ("$logic_and", &["A", "B"]),
    ("$logic_or", &["A", "B"]),
    ("$_AND_", &["A", "B"]),
    ("$_OR_", &["A", "B"]),
    ("$_XOR_", &["A", "B"]),
];

/// Solver-scoped configuration: read-only while a search runs.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    compatible_types: HashSet<(String, String)>,
    swap_ports: HashMap<String, Vec<BTreeSet<String>>>,
    perm_ports: HashMap<String, Vec<PortPermutation>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register [`DEFAULT_SWAP_PORTS`].
    pub fn add_default_swaps(&mut self) {
        for (ty, ports) in DEFAULT_SWAP_PORTS {
            self.add_swappable_ports(ty, ports.iter().copied());
        }
    }

    pub fn add_compatible_types(&mut self, needle_type: &str, haystack_type: &str) {
        self.compatible_types
            .insert((needle_type.to_string(), haystack_type.to_string()));
    }

    /// Declare a set of ports of `ty` as freely interchangeable.
    pub fn add_swappable_ports<S: AsRef<str>>(&mut self, ty: &str, ports: impl IntoIterator<Item = S>) {
        let set: BTreeSet<String> = ports.into_iter().map(|p| p.as_ref().to_string()).collect();
        if set.len() > 1 {
            self.swap_ports.entry(ty.to_string()).or_default().push(set);
        }
    }

    /// Declare that ports `left[i]` may be read as `right[i]` on cells of `ty`.
    ///
    /// Both sides must list the same ports without repeats.
    pub fn add_swappable_ports_permutation<S: AsRef<str>>(
        &mut self,
        ty: &str,
        left: &[S],
        right: &[S],
    ) -> Result<(), SolverError> {
        let invalid = |reason: &str| SolverError::InvalidPermutation {
            type_name: ty.to_string(),
            reason: reason.to_string(),
        };
        if left.len() != right.len() {
            return Err(invalid("both sides must have the same number of ports"));
        }
        let l: BTreeSet<&str> = left.iter().map(AsRef::as_ref).collect();
        let r: BTreeSet<&str> = right.iter().map(AsRef::as_ref).collect();
        if l.len() != left.len() || r.len() != right.len() {
            return Err(invalid("a port is listed twice"));
        }
        if l != r {
            return Err(invalid("both sides must name the same ports"));
        }

        let perm: PortPermutation = left
            .iter()
            .zip(right)
            .filter(|(a, b)| a.as_ref() != b.as_ref())
            .map(|(a, b)| (a.as_ref().to_string(), b.as_ref().to_string()))
            .collect();
        if !perm.is_empty() {
            self.perm_ports.entry(ty.to_string()).or_default().push(perm);
        }
        Ok(())
    }

    /// Whether a needle node of `needle_type` may map onto `haystack_type`.
    #[must_use]
    pub fn types_compatible(&self, needle_type: &str, haystack_type: &str) -> bool {
        needle_type == haystack_type
            || self
                .compatible_types
                .contains(&(needle_type.to_string(), haystack_type.to_string()))
    }

    /// Every port renaming allowed for `ty`, identity first.
    ///
    /// Each swap set contributes all orderings of its ports; the result is then
    /// closed under the explicit permutations.
    #[must_use]
    pub fn permutations(&self, ty: &str) -> Vec<PortPermutation> {
        let mut perms: Vec<PortPermutation> = vec![PortPermutation::new()];

        for set in self.swap_ports.get(ty).into_iter().flatten() {
            let ports: Vec<String> = set.iter().cloned().collect();
            let orderings: Vec<PortPermutation> = ports
                .iter()
                .permutations(ports.len())
                .map(|order| {
                    ports
                        .iter()
                        .zip(order)
                        .filter(|&(a, b)| a != b)
                        .map(|(a, b)| (a.clone(), b.clone()))
                        .collect()
                })
                .collect();
            perms = perms
                .iter()
                .cartesian_product(&orderings)
                .map(|(p, o)| compose(p, o))
                .collect();
        }

        if let Some(explicit) = self.perm_ports.get(ty) {
            let mut seen: BTreeSet<PortPermutation> = perms.iter().cloned().collect();
            let mut frontier = perms.clone();
            while !frontier.is_empty() {
                let mut next = Vec::new();
                for p in &frontier {
                    for e in explicit {
                        let c = compose(p, e);
                        if seen.insert(c.clone()) {
                            next.push(c);
                        }
                    }
                }
                perms.extend(next.iter().cloned());
                frontier = next;
            }
        }

        perms.into_iter().unique().collect()
    }
}

/// Apply `first`, then `second`.
fn compose(first: &PortPermutation, second: &PortPermutation) -> PortPermutation {
    let apply = |p: &PortPermutation, port: &str| -> String {
        p.get(port).cloned().unwrap_or_else(|| port.to_string())
    };
    first
        .keys()
        .chain(second.keys())
        .map(|port| (port.clone(), apply(second, &apply(first, port))))
        .filter(|(a, b)| a != b)
        .collect()
}

/// Name a needle port maps to under a permutation.
#[must_use]
pub fn permuted<'a>(perm: &'a PortPermutation, port: &'a str) -> &'a str {
    perm.get(port).map_or(port, String::as_str)
}
