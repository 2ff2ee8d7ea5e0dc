//! Boundary selections over a design.
//!
//! A selection covers whole modules or a subset of the cells and wires of a
//! module. Graph conversion uses it to decide which cells become nodes and
//! which wires may carry edges.

use std::collections::HashSet;

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModuleSelection {
    Whole,
    Partial {
        cells: HashSet<String>,
        wires: HashSet<String>,
    },
}

/// Which parts of a design are in scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    full_design: bool,
    modules: IndexMap<String, ModuleSelection>,
}

impl Selection {
    /// Every module, cell and wire.
    #[must_use]
    pub fn whole_design() -> Self {
        Self {
            full_design: true,
            modules: IndexMap::new(),
        }
    }

    /// Nothing selected yet.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Select a module with all its contents.
    pub fn select_module(&mut self, module: &str) -> &mut Self {
        self.modules.insert(module.to_string(), ModuleSelection::Whole);
        self
    }

    /// Select one cell. Has no effect on a wholly selected module.
    pub fn select_cell(&mut self, module: &str, cell: &str) -> &mut Self {
        if let ModuleSelection::Partial { cells, .. } = self.partial(module) {
            cells.insert(cell.to_string());
        }
        self
    }

    /// Select one wire. Has no effect on a wholly selected module.
    pub fn select_wire(&mut self, module: &str, wire: &str) -> &mut Self {
        if let ModuleSelection::Partial { wires, .. } = self.partial(module) {
            wires.insert(wire.to_string());
        }
        self
    }

    fn partial(&mut self, module: &str) -> &mut ModuleSelection {
        self.modules
            .entry(module.to_string())
            .or_insert_with(|| ModuleSelection::Partial {
                cells: HashSet::new(),
                wires: HashSet::new(),
            })
    }

    /// Whether any part of the module is selected.
    #[must_use]
    pub fn selected_module(&self, module: &str) -> bool {
        self.full_design || self.modules.contains_key(module)
    }

    /// Whether the module is selected as a whole.
    #[must_use]
    pub fn selected_whole_module(&self, module: &str) -> bool {
        self.full_design || matches!(self.modules.get(module), Some(ModuleSelection::Whole))
    }

    #[must_use]
    pub fn selected_cell(&self, module: &str, cell: &str) -> bool {
        if self.full_design {
            return true;
        }
        match self.modules.get(module) {
            Some(ModuleSelection::Whole) => true,
            Some(ModuleSelection::Partial { cells, .. }) => cells.contains(cell),
            None => false,
        }
    }

    #[must_use]
    pub fn selected_wire(&self, module: &str, wire: &str) -> bool {
        if self.full_design {
            return true;
        }
        match self.modules.get(module) {
            Some(ModuleSelection::Whole) => true,
            Some(ModuleSelection::Partial { wires, .. }) => wires.contains(wire),
            None => false,
        }
    }
}
