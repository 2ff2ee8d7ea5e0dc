//! Modules and designs.
//!
//! A [`Module`] owns its wires and cells in declaration order; that order is the
//! stable enumeration order every consumer (graph conversion, reporting) relies
//! on. A [`Design`] is an ordered collection of modules.

use std::collections::HashMap;

use contracts::debug_requires;
use indexmap::IndexMap;

use super::cell::Cell;
use super::sig::{Const, SigBit, SigSpec};
use super::wire::{PortDirection, Wire, WireId};

/// A flat or hierarchical netlist module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Module {
    /// Module name, stored without the RTLIL escape prefix.
    pub name: String,
    /// Module attributes (e.g. `extract_order`, `top`).
    pub attributes: IndexMap<String, Const>,
    /// Alias assignments `lhs = rhs`, resolved by [`super::SigMap`].
    pub connections: Vec<(SigSpec, SigSpec)>,
    /// Names of processes that have not been lowered to cells yet.
    pub processes: Vec<String>,
    wires: Vec<Wire>,
    wire_index: HashMap<String, WireId>,
    cells: Vec<Cell>,
    cell_index: HashMap<String, usize>,
    ports: Vec<String>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an internal wire and return its id.
    #[debug_requires(!self.wire_index.contains_key(name), "wire names are unique")]
    pub fn add_wire(&mut self, name: &str, width: usize) -> WireId {
        let id = WireId::new(self.wires.len());
        self.wires.push(Wire::new(id, name, width));
        self.wire_index.insert(name.to_string(), id);
        id
    }

    /// Add a boundary port wire.
    pub fn add_port(&mut self, name: &str, width: usize, direction: PortDirection) -> WireId {
        let id = self.add_wire(name, width);
        self.ports.push(name.to_string());
        let port_id = self.ports.len();
        let wire = &mut self.wires[id.as_usize()];
        wire.port_id = port_id;
        wire.port_input = matches!(direction, PortDirection::Input | PortDirection::Inout);
        wire.port_output = matches!(direction, PortDirection::Output | PortDirection::Inout);
        id
    }

    /// Add an input port wire.
    pub fn add_input(&mut self, name: &str, width: usize) -> WireId {
        self.add_port(name, width, PortDirection::Input)
    }

    /// Add an output port wire.
    pub fn add_output(&mut self, name: &str, width: usize) -> WireId {
        self.add_port(name, width, PortDirection::Output)
    }

    /// Add a cell and return it for further configuration.
    #[debug_requires(!self.cell_index.contains_key(name), "cell names are unique")]
    pub fn add_cell(&mut self, name: &str, ty: &str) -> &mut Cell {
        let idx = self.cells.len();
        self.cells.push(Cell::new(name, ty));
        self.cell_index.insert(name.to_string(), idx);
        &mut self.cells[idx]
    }

    /// Record the alias assignment `lhs = rhs`.
    #[debug_requires(lhs.len() == rhs.len())]
    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        self.connections.push((lhs, rhs));
    }

    /// Record an unlowered process.
    pub fn add_process(&mut self, name: &str) {
        self.processes.push(name.to_string());
    }

    /// Whether the module still contains processes.
    #[must_use]
    pub fn has_processes(&self) -> bool {
        !self.processes.is_empty()
    }

    /// Look a wire up by name.
    #[must_use]
    pub fn wire(&self, name: &str) -> Option<&Wire> {
        self.wire_index.get(name).map(|id| &self.wires[id.as_usize()])
    }

    /// Mutable access to a wire by name.
    pub fn wire_mut(&mut self, name: &str) -> Option<&mut Wire> {
        let id = *self.wire_index.get(name)?;
        Some(&mut self.wires[id.as_usize()])
    }

    /// The wire behind an id.
    #[must_use]
    pub fn wire_by_id(&self, id: WireId) -> &Wire {
        &self.wires[id.as_usize()]
    }

    /// The wire a signal bit belongs to, if it is not a literal.
    #[must_use]
    pub fn wire_of(&self, bit: &SigBit) -> Option<&Wire> {
        bit.as_wire().map(|id| self.wire_by_id(id))
    }

    /// Wires in declaration order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter()
    }

    /// Cells in declaration order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Look a cell up by name.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cell_index.get(name).map(|&idx| &self.cells[idx])
    }

    /// Mutable access to a cell by name.
    pub fn cell_mut(&mut self, name: &str) -> Option<&mut Cell> {
        let idx = *self.cell_index.get(name)?;
        Some(&mut self.cells[idx])
    }

    /// Declaration index of a cell.
    #[must_use]
    pub fn cell_position(&self, name: &str) -> Option<usize> {
        self.cell_index.get(name).copied()
    }

    /// Cell at a declaration index.
    #[must_use]
    pub fn cell_at(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    /// Port names in port order.
    #[must_use]
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Port wires in port order.
    pub fn port_wires(&self) -> impl Iterator<Item = &Wire> {
        self.ports.iter().filter_map(|p| self.wire(p))
    }

    /// An attribute value, if set.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Const> {
        self.attributes.get(name)
    }
}

/// An ordered collection of modules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Design {
    modules: IndexMap<String, Module>,
}

impl Design {
    /// Creates an empty design.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module, replacing any module of the same name.
    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    /// Look a module up by name. A leading RTLIL escape is ignored.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(crate::id_string::unescape_id(name))
    }

    /// Mutable access to a module.
    pub fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.get_mut(crate::id_string::unescape_id(name))
    }

    /// Modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the design has no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<Module> for Design {
    fn from_iter<T: IntoIterator<Item = Module>>(iter: T) -> Self {
        let mut design = Self::new();
        for module in iter {
            design.add_module(module);
        }
        design
    }
}
