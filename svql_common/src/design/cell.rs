//! Cell instances and their pin connections.

use indexmap::IndexMap;

use super::sig::{Const, SigSpec};
use super::wire::PortDirection;

/// Output pins of built-in cells when no explicit direction is recorded.
const BUILTIN_OUTPUT_PORTS: &[&str] = &["Y", "Q", "CO", "X"];

/// One instantiated circuit element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Instance name, stored without the RTLIL escape prefix.
    pub name: String,
    /// Cell type tag, e.g. `$and`, `$_AND_` or a user module name.
    pub ty: String,
    /// Parameter values.
    pub parameters: IndexMap<String, Const>,
    /// Attribute values (e.g. `src`).
    pub attributes: IndexMap<String, Const>,
    /// Pin connections in declaration order.
    pub connections: IndexMap<String, SigSpec>,
    /// Explicit pin directions, as recorded by the netlist source.
    pub port_directions: IndexMap<String, PortDirection>,
}

impl Cell {
    /// Creates a cell with no connections.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            parameters: IndexMap::new(),
            attributes: IndexMap::new(),
            connections: IndexMap::new(),
            port_directions: IndexMap::new(),
        }
    }

    /// Connect a pin, replacing any previous connection.
    pub fn set_port(&mut self, port: impl Into<String>, sig: SigSpec) -> &mut Self {
        self.connections.insert(port.into(), sig);
        self
    }

    /// Connect a pin and record its direction.
    pub fn set_port_dir(
        &mut self,
        port: impl Into<String>,
        direction: PortDirection,
        sig: SigSpec,
    ) -> &mut Self {
        let port = port.into();
        self.port_directions.insert(port.clone(), direction);
        self.connections.insert(port, sig);
        self
    }

    /// Set a parameter.
    pub fn set_param(&mut self, name: impl Into<String>, value: Const) -> &mut Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: Const) -> &mut Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Connection of a pin, if present.
    #[must_use]
    pub fn port(&self, port: &str) -> Option<&SigSpec> {
        self.connections.get(port)
    }

    /// Whether `port` is an output pin of this cell.
    #[must_use]
    pub fn is_output(&self, port: &str) -> bool {
        match self.port_directions.get(port) {
            Some(dir) => matches!(dir, PortDirection::Output | PortDirection::Inout),
            None => self.is_builtin() && BUILTIN_OUTPUT_PORTS.contains(&port),
        }
    }

    /// Whether the cell type is one of the generated `$`-prefixed types.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.ty.starts_with('$')
    }

    /// The `src` attribute, if the cell has one.
    #[must_use]
    pub fn src_attribute(&self) -> Option<String> {
        match self.attributes.get("src")? {
            Const::Str(s) => Some(s.clone()),
            Const::Bits(_) => None,
        }
    }
}
