//! Module to graph conversion.

use std::collections::{HashMap, HashSet};
use std::fmt;

use svql_common::design::{Cell, Module, SigBit, SigMap, Selection, State, WireId};
use tracing::debug;

use crate::graph::{Graph, NodeId, PinBit};

/// Name of the constant driver node for a logic state.
#[must_use]
pub fn const_node_name(state: State) -> &'static str {
    match state {
        State::S0 => "$const$0",
        State::S1 => "$const$1",
        State::Sx => "$const$x",
        State::Sz => "$const$z",
    }
}

/// Output port of the constant driver nodes.
pub const CONST_PORT: &str = "Y";

/// Borrowed reference from a graph node back to its cell.
#[derive(Clone, Copy)]
pub struct CellRef<'a> {
    pub module: &'a Module,
    pub index: usize,
}

impl<'a> CellRef<'a> {
    #[must_use]
    pub fn cell(&self) -> &'a Cell {
        self.module.cell_at(self.index)
    }
}

impl fmt::Debug for CellRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module.name, self.cell().name)
    }
}

impl PartialEq for CellRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.module, other.module) && self.index == other.index
    }
}

impl Eq for CellRef<'_> {}

/// Why a module was not turned into a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The module is outside the boundary selection.
    NotSelected,
    /// The module still contains processes.
    UnprocessedProcesses,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotSelected => write!(f, "module is not selected"),
            Rejection::UnprocessedProcesses => write!(f, "module contains unprocessed processes"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BuildOptions<'s> {
    /// Model literal bits as edges from shared constant driver nodes.
    pub const_ports: bool,
    /// Only cells and wires inside the selection take part.
    pub selection: Option<&'s Selection>,
    /// Signal bits read by more sink pins than this get no edges.
    pub max_fanout: Option<usize>,
    /// `(cell type, port)` pairs whose connectivity is not wired up.
    pub split_ports: HashSet<(String, String)>,
}

impl<'s> BuildOptions<'s> {
    #[must_use]
    pub fn with_const_ports(mut self, const_ports: bool) -> Self {
        self.const_ports = const_ports;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: &'s Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    #[must_use]
    pub fn with_max_fanout(mut self, max_fanout: Option<usize>) -> Self {
        self.max_fanout = max_fanout;
        self
    }

    #[must_use]
    pub fn with_split_port(mut self, cell_type: &str, port: &str) -> Self {
        self.split_ports.insert((cell_type.to_string(), port.to_string()));
        self
    }
}

/// Convert a module into a graph whose nodes point back at the module's cells.
///
/// Literal bits become edges to the four constant driver nodes when
/// `const_ports` is set and inline pin constants otherwise. The first pin that
/// references a canonical bit becomes its driver reference; every later pin
/// connects to it. Driver references of bits that are also read by unselected
/// cells or by module ports are marked extern.
pub fn module_to_graph<'a>(
    module: &'a Module,
    options: &BuildOptions<'_>,
) -> Result<Graph<CellRef<'a>>, Rejection> {
    let sel = options.selection;

    if sel.is_some_and(|s| !s.selected_module(&module.name)) {
        debug!("skipping module {} as it is not selected", module.name);
        return Err(Rejection::NotSelected);
    }
    if module.has_processes() {
        debug!("skipping module {} as it contains unprocessed processes", module.name);
        return Err(Rejection::UnprocessedProcesses);
    }

    let sigmap = SigMap::new(module);
    let cell_selected = |cell: &Cell| sel.is_none_or(|s| s.selected_cell(&module.name, &cell.name));
    let wire_selected =
        |wire: WireId| sel.is_none_or(|s| s.selected_wire(&module.name, &module.wire_by_id(wire).name));

    let mut graph = Graph::new(module.name.clone());

    let mut const_nodes: HashMap<State, NodeId> = HashMap::new();
    if options.const_ports {
        for state in State::ALL {
            let name = const_node_name(state);
            let node = graph.add_node(name, name, None);
            let port = graph.add_port(node, CONST_PORT, 1);
            graph.mark_extern(PinBit::new(node, port, 0));
            const_nodes.insert(state, node);
        }
    }

    let fanout = options
        .max_fanout
        .filter(|&m| m > 0)
        .map(|_| sink_use_counts(module, &sigmap, &cell_selected));

    let mut driver: HashMap<SigBit, PinBit> = HashMap::new();

    for (index, cell) in module.cells().enumerate() {
        if !cell_selected(cell) {
            continue;
        }
        let node = graph.add_node(&cell.name, &cell.ty, Some(CellRef { module, index }));

        for (port_name, sig) in &cell.connections {
            let port = graph.add_port(node, port_name, sig.len());

            if options.split_ports.contains(&(cell.ty.clone(), port_name.clone())) {
                continue;
            }

            for (i, bit) in sigmap.apply(sig).into_iter().enumerate() {
                let pin = PinBit::new(node, port, i);
                let wire = match bit {
                    SigBit::Const(state) => {
                        match const_nodes.get(&state) {
                            Some(&c) => graph.connect(pin, PinBit::new(c, 0, 0)),
                            None => graph.set_constant(pin, state),
                        }
                        continue;
                    },
                    SigBit::Wire { wire, .. } => wire,
                };

                if let (Some(counts), Some(max)) = (&fanout, options.max_fanout) {
                    if counts.get(&bit).copied().unwrap_or(0) > max {
                        continue;
                    }
                }

                if !wire_selected(wire) {
                    continue;
                }

                let source = *driver.entry(bit).or_insert(pin);
                graph.connect(source, pin);
            }
        }
    }

    // bits read by unselected cells
    for cell in module.cells().filter(|c| !cell_selected(*c)) {
        for sig in cell.connections.values() {
            for bit in sigmap.apply(sig) {
                if let Some(&pin) = driver.get(&bit) {
                    graph.mark_extern(pin);
                }
            }
        }
    }

    // bits visible at module ports
    for wire in module.port_wires() {
        for bit in sigmap.apply(&wire.sig()) {
            if let Some(&pin) = driver.get(&bit) {
                graph.mark_extern(pin);
            }
        }
    }

    debug!(
        "converted module {} into {} nodes and {} connections",
        module.name,
        graph.node_count(),
        graph.connections().len()
    );
    Ok(graph)
}

/// Count, per canonical bit, the sink pin positions of selected cells that read it.
fn sink_use_counts(
    module: &Module,
    sigmap: &SigMap,
    cell_selected: &impl Fn(&Cell) -> bool,
) -> HashMap<SigBit, usize> {
    let mut counts = HashMap::new();
    for cell in module.cells().filter(|c| cell_selected(*c)) {
        for (port, sig) in &cell.connections {
            if cell.is_output(port) {
                continue;
            }
            for bit in sigmap.apply(sig) {
                if !bit.is_const() {
                    *counts.entry(bit).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}
