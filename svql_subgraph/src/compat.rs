//! Cell-level compatibility checks consulted for every candidate node pair.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use indexmap::IndexMap;
use svql_common::design::{Cell, Const, Module, WireId};
use svql_common::RegexMap;
use tracing::{debug, trace};

use crate::conversion::CellRef;
use crate::solver::{NodeComparator, PortMap};

/// Parameters of generated cells compared by truth value.
const BOOL_PARAMS: &[&str] = &[
    "ARST_POLARITY",
    "A_SIGNED",
    "B_SIGNED",
    "CLK_ENABLE",
    "CLK_POLARITY",
    "CLR_POLARITY",
    "EN_POLARITY",
    "SET_POLARITY",
    "TRANSPARENT",
];

/// Parameters of generated cells compared by integer value.
const INT_PARAMS: &[&str] = &[
    "ABITS",
    "A_WIDTH",
    "B_WIDTH",
    "CTRL_IN_WIDTH",
    "CTRL_OUT_WIDTH",
    "OFFSET",
    "PORTID",
    "PRIORITY",
    "RD_PORTS",
    "SIZE",
    "STATE_BITS",
    "STATE_NUM",
    "STATE_NUM_LOG2",
    "STATE_RST",
    "S_WIDTH",
    "TRANS_NUM",
    "WIDTH",
    "WR_PORTS",
    "Y_WIDTH",
];

/// Normalise a parameter value so that encodings of the same number or flag
/// compare equal. Only word-level built-in types (`$` but not `$_`) are
/// normalised.
#[must_use]
pub fn unified_param(cell_type: &str, param: &str, value: &Const) -> Const {
    if !cell_type.starts_with('$') || cell_type.starts_with("$_") {
        return value.clone();
    }
    if BOOL_PARAMS.contains(&param) {
        return Const::from_bool(value.as_bool());
    }
    if INT_PARAMS.contains(&param) {
        return Const::from_int(value.as_int());
    }
    value.clone()
}

/// What the cell comparator looks at besides the type.
#[derive(Clone, Debug, Default)]
pub struct CompareOptions {
    pub ignore_parameters: bool,
    /// `(cell type, parameter)` pairs left out of parameter comparison.
    pub ignored_params: HashSet<(String, String)>,
    pub cell_attr: BTreeSet<String>,
    pub wire_attr: BTreeSet<String>,
    pub regex_map: RegexMap,
}

/// Compares the cells behind two graph nodes.
#[derive(Clone, Debug, Default)]
pub struct CellComparator {
    options: CompareOptions,
}

impl CellComparator {
    #[must_use]
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Add regex entries; later entries win per signal.
    pub fn join_regex_map(&mut self, other: RegexMap) {
        self.options.regex_map.join(other);
    }

    fn params(&self, cell: &Cell) -> BTreeMap<String, Const> {
        cell.parameters
            .iter()
            .filter(|(name, _)| {
                !self
                    .options
                    .ignored_params
                    .contains(&(cell.ty.clone(), (*name).clone()))
            })
            .map(|(name, value)| (name.clone(), unified_param(&cell.ty, name, value)))
            .collect()
    }

    fn params_match(&self, needle: &Cell, haystack: &Cell) -> bool {
        self.options.ignore_parameters || self.params(needle) == self.params(haystack)
    }

    fn wire_attrs_match(&self, needle: &CellRef<'_>, haystack: &CellRef<'_>, port_map: &PortMap) -> bool {
        let empty = IndexMap::new();
        let (n_cell, h_cell) = (needle.cell(), haystack.cell());
        let mut last: (Option<WireId>, Option<WireId>) = (None, None);

        for (port, n_sig) in &n_cell.connections {
            let h_sig = port_map
                .get(port)
                .and_then(|h_port| h_cell.port(h_port))
                .map_or(&[][..], Vec::as_slice);

            for (n_bit, h_bit) in n_sig.iter().zip(h_sig) {
                let pair = (n_bit.as_wire(), h_bit.as_wire());
                if pair != last
                    && !compare_attributes(
                        &self.options.wire_attr,
                        wire_attributes(needle.module, pair.0, &empty),
                        wire_attributes(haystack.module, pair.1, &empty),
                    )
                {
                    return false;
                }
                last = pair;
            }
        }
        true
    }

    fn regex_match(&self, needle: &CellRef<'_>, haystack: &CellRef<'_>) -> bool {
        let Some(patterns) = self.options.regex_map.module(&needle.module.name) else {
            return true;
        };

        let n_wires = output_wires(needle.cell());
        let h_wires = output_wires(haystack.cell());

        for (i, n_wire) in n_wires.iter().enumerate() {
            let Some(n_wire) = n_wire else {
                continue;
            };
            let n_name = &needle.module.wire_by_id(*n_wire).name;
            let Some(entry) = patterns.get(n_name) else {
                continue;
            };
            let Some(Some(h_wire)) = h_wires.get(i) else {
                debug!(
                    "haystack has no output bit {} for needle signal {} (regex \"{}\")",
                    i, n_name, entry.pattern
                );
                return false;
            };
            let h_name = &haystack.module.wire_by_id(*h_wire).name;
            let ok = entry.is_match(h_name);
            trace!(
                "bit {}: needle={} haystack={} pattern={} -> {}",
                i,
                n_name,
                h_name,
                entry.pattern,
                if ok { "match" } else { "mismatch" }
            );
            if !ok {
                return false;
            }
        }
        true
    }
}

impl<'a> NodeComparator<CellRef<'a>> for CellComparator {
    fn compatible(
        &self,
        needle: Option<&CellRef<'a>>,
        haystack: Option<&CellRef<'a>>,
        port_map: &PortMap,
    ) -> bool {
        let (Some(needle), Some(haystack)) = (needle, haystack) else {
            debug_assert!(needle.is_none() && haystack.is_none());
            return true;
        };
        let (n_cell, h_cell) = (needle.cell(), haystack.cell());

        if !self.params_match(n_cell, h_cell) {
            trace!("{} / {}: parameters differ", n_cell.name, h_cell.name);
            return false;
        }

        if !self.options.cell_attr.is_empty()
            && !compare_attributes(&self.options.cell_attr, &n_cell.attributes, &h_cell.attributes)
        {
            trace!("{} / {}: cell attributes differ", n_cell.name, h_cell.name);
            return false;
        }

        if !self.options.wire_attr.is_empty() && !self.wire_attrs_match(needle, haystack, port_map) {
            trace!("{} / {}: wire attributes differ", n_cell.name, h_cell.name);
            return false;
        }

        if !self.regex_match(needle, haystack) {
            debug!("{} / {}: output names rejected by regex", n_cell.name, h_cell.name);
            return false;
        }

        true
    }
}

/// Each listed attribute must be absent on both sides or equal on both.
#[must_use]
pub fn compare_attributes(
    names: &BTreeSet<String>,
    needle: &IndexMap<String, Const>,
    haystack: &IndexMap<String, Const>,
) -> bool {
    names.iter().all(|name| needle.get(name) == haystack.get(name))
}

fn wire_attributes<'m>(
    module: &'m Module,
    wire: Option<WireId>,
    empty: &'m IndexMap<String, Const>,
) -> &'m IndexMap<String, Const> {
    wire.map_or(empty, |w| &module.wire_by_id(w).attributes)
}

/// Wires driven by the cell's output ports, one entry per output bit in
/// connection order. Literal bits yield `None`.
#[must_use]
pub fn output_wires(cell: &Cell) -> Vec<Option<WireId>> {
    cell.connections
        .iter()
        .filter(|(port, _)| cell.is_output(port))
        .flat_map(|(_, sig)| sig.iter().map(|bit| bit.as_wire()))
        .collect()
}
