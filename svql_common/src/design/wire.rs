//! Named wires and their port flags.

use std::fmt;

use indexmap::IndexMap;

use super::sig::{Const, SigBit, SigSpec};

/// Index of a wire inside its module's wire table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId {
    inner: u32,
}

impl WireId {
    /// Creates a wire id from a raw table index.
    #[must_use]
    pub const fn new(idx: usize) -> Self {
        Self { inner: idx as u32 }
    }

    /// Returns the index as a usize for table access.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.inner as usize
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.inner)
    }
}

/// Direction of a module-level port as seen from inside the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Driven from outside.
    Input,
    /// Driven from inside.
    Output,
    /// Bidirectional.
    Inout,
}

/// A multi-bit conductor inside a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wire {
    /// Wire name, stored without the RTLIL escape prefix.
    pub name: String,
    /// Number of bits.
    pub width: usize,
    /// Attribute map (e.g. `keep`, `src`).
    pub attributes: IndexMap<String, Const>,
    /// 1-based position in the module port list, 0 when the wire is not a port.
    pub port_id: usize,
    /// Set for input and inout ports.
    pub port_input: bool,
    /// Set for output and inout ports.
    pub port_output: bool,
    pub(crate) id: WireId,
}

impl Wire {
    pub(crate) fn new(id: WireId, name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
            attributes: IndexMap::new(),
            port_id: 0,
            port_input: false,
            port_output: false,
            id,
        }
    }

    /// This wire's id inside its module.
    #[must_use]
    pub const fn id(&self) -> WireId {
        self.id
    }

    /// True when the wire is a module boundary port.
    #[must_use]
    pub const fn is_port(&self) -> bool {
        self.port_id > 0
    }

    /// Port direction, if the wire is a port.
    #[must_use]
    pub const fn direction(&self) -> Option<PortDirection> {
        match (self.port_input, self.port_output) {
            (true, false) => Some(PortDirection::Input),
            (false, true) => Some(PortDirection::Output),
            (true, true) => Some(PortDirection::Inout),
            (false, false) => None,
        }
    }

    /// All bits of the wire, LSB first.
    #[must_use]
    pub fn sig(&self) -> SigSpec {
        (0..self.width).map(|i| SigBit::wire(self.id, i)).collect()
    }

    /// A single bit of the wire.
    #[must_use]
    pub fn bit(&self, offset: usize) -> SigBit {
        debug_assert!(offset < self.width);
        SigBit::wire(self.id, offset)
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire ")?;
        if self.width != 1 {
            write!(f, "width {} ", self.width)?;
        }
        match self.direction() {
            Some(PortDirection::Input) => write!(f, "input {} ", self.port_id)?,
            Some(PortDirection::Output) => write!(f, "output {} ", self.port_id)?,
            Some(PortDirection::Inout) => write!(f, "inout {} ", self.port_id)?,
            None => {}
        }
        write!(f, "{}", self.name)
    }
}
