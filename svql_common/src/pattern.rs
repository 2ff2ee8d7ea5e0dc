use serde::{Deserialize, Serialize};

use crate::design::{Module, PortDirection};

/// Boundary ports of a needle module.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pattern {
    pub file_loc: String,
    pub in_ports: Vec<String>,
    pub out_ports: Vec<String>,
    pub inout_ports: Vec<String>,
}

impl Pattern {
    /// List the ports of `module` by direction, in port order.
    pub fn from_module(file_loc: impl Into<String>, module: &Module) -> Self {
        let mut pattern = Pattern {
            file_loc: file_loc.into(),
            ..Default::default()
        };
        for wire in module.port_wires() {
            let bucket = match wire.direction() {
                Some(PortDirection::Input) => &mut pattern.in_ports,
                Some(PortDirection::Output) => &mut pattern.out_ports,
                Some(PortDirection::Inout) => &mut pattern.inout_ports,
                None => continue,
            };
            bucket.push(wire.name.clone());
        }
        pattern
    }

    /// Whether `name` is one of the boundary ports.
    #[must_use]
    pub fn is_port(&self, name: &str) -> bool {
        self.in_ports
            .iter()
            .chain(&self.out_ports)
            .chain(&self.inout_ports)
            .any(|p| p == name)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
