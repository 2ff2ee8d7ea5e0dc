//! Canonical signal resolution.
//!
//! A [`SigMap`] folds every alias assignment of a module into equivalence
//! classes and picks one representative bit per class. Literal bits always win
//! as representatives; otherwise the first bit seen becomes the representative.

use std::collections::HashMap;

use super::module::Module;
use super::sig::{SigBit, SigSpec};

/// Union-find over the signal bits of one module.
#[derive(Clone, Debug, Default)]
pub struct SigMap {
    parent: HashMap<SigBit, SigBit>,
}

impl SigMap {
    /// Build the canonicaliser from a module's alias assignments.
    #[must_use]
    pub fn new(module: &Module) -> Self {
        let mut map = Self::default();
        for (lhs, rhs) in &module.connections {
            for (a, b) in lhs.iter().zip(rhs.iter()) {
                map.add(*a, *b);
            }
        }
        map
    }

    /// Merge the classes of two bits.
    pub fn add(&mut self, a: SigBit, b: SigBit) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        // keep literals as representatives
        let (root, child) = match (ra.is_const(), rb.is_const()) {
            (false, true) => (rb, ra),
            _ => (ra, rb),
        };
        self.parent.insert(child, root);
    }

    fn find(&mut self, bit: SigBit) -> SigBit {
        let mut root = bit;
        while let Some(&next) = self.parent.get(&root) {
            root = next;
        }
        let mut cur = bit;
        while let Some(&next) = self.parent.get(&cur) {
            if next == root {
                break;
            }
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    /// The representative of a bit.
    #[must_use]
    pub fn resolve(&self, bit: SigBit) -> SigBit {
        let mut root = bit;
        while let Some(&next) = self.parent.get(&root) {
            root = next;
        }
        root
    }

    /// Resolve every bit of a signal spec.
    #[must_use]
    pub fn apply(&self, sig: &[SigBit]) -> SigSpec {
        sig.iter().map(|b| self.resolve(*b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::State;

    #[test]
    fn aliases_share_a_representative() {
        let mut m = Module::new("m");
        let a = m.add_wire("a", 1);
        let b = m.add_wire("b", 1);
        let c = m.add_wire("c", 1);
        m.connect(vec![SigBit::wire(b, 0)], vec![SigBit::wire(a, 0)]);
        m.connect(vec![SigBit::wire(c, 0)], vec![SigBit::wire(b, 0)]);
        let map = SigMap::new(&m);
        let ra = map.resolve(SigBit::wire(a, 0));
        assert_eq!(map.resolve(SigBit::wire(b, 0)), ra);
        assert_eq!(map.resolve(SigBit::wire(c, 0)), ra);
    }

    #[test]
    fn constants_become_representatives() {
        let mut m = Module::new("m");
        let a = m.add_wire("a", 2);
        m.connect(
            vec![SigBit::wire(a, 0), SigBit::wire(a, 1)],
            vec![SigBit::Const(State::S1), SigBit::Const(State::S0)],
        );
        let map = SigMap::new(&m);
        assert_eq!(
            map.apply(&[SigBit::wire(a, 1), SigBit::wire(a, 0)]),
            vec![SigBit::Const(State::S0), SigBit::Const(State::S1)]
        );
    }
}
