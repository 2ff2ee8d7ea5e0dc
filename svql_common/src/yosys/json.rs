//! Reader for yosys `write_json` netlists.

use std::collections::HashMap;
use std::io::Read;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::ImportError;
use crate::design::{Const, Design, Module, PortDirection, SigBit, SigSpec, State, WireId};

#[derive(Deserialize)]
struct JsonDesign {
    #[serde(default)]
    modules: IndexMap<String, JsonModule>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonModule {
    attributes: IndexMap<String, Value>,
    ports: IndexMap<String, JsonPort>,
    cells: IndexMap<String, JsonCell>,
    netnames: IndexMap<String, JsonNet>,
    processes: Vec<String>,
}

#[derive(Deserialize)]
struct JsonPort {
    direction: String,
    bits: Vec<JsonBit>,
}

#[derive(Deserialize)]
struct JsonCell {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    parameters: IndexMap<String, Value>,
    #[serde(default)]
    attributes: IndexMap<String, Value>,
    #[serde(default)]
    port_directions: IndexMap<String, String>,
    #[serde(default)]
    connections: IndexMap<String, Vec<JsonBit>>,
}

#[derive(Deserialize)]
struct JsonNet {
    bits: Vec<JsonBit>,
    #[serde(default)]
    attributes: IndexMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonBit {
    Id(u64),
    Const(String),
}

/// Parse a yosys JSON netlist.
///
/// Bit ids shared by several netnames become alias connections. Ids that no
/// netname covers get a synthetic `$sig$<id>` wire.
pub fn import_json(reader: impl Read) -> Result<Design, ImportError> {
    let json: JsonDesign = serde_json::from_reader(reader)?;
    json.modules
        .iter()
        .map(|(name, module)| ModuleReader::new(name).read(module))
        .collect()
}

struct ModuleReader {
    module: Module,
    bits: HashMap<u64, SigBit>,
}

impl ModuleReader {
    fn new(name: &str) -> Self {
        Self {
            module: Module::new(crate::id_string::unescape_id(name)),
            bits: HashMap::new(),
        }
    }

    fn read(mut self, json: &JsonModule) -> Result<Module, ImportError> {
        for (k, v) in &json.attributes {
            let value = self.constant(v)?;
            self.module.attributes.insert(k.clone(), value);
        }

        for (name, port) in &json.ports {
            let direction = self.direction(&port.direction)?;
            let id = self.module.add_port(name, port.bits.len(), direction);
            self.bind(id, &port.bits)?;
            if let Some(net) = json.netnames.get(name) {
                self.wire_attributes(name, net)?;
            }
        }

        for (name, net) in &json.netnames {
            if json.ports.contains_key(name) {
                continue;
            }
            let id = self.module.add_wire(name, net.bits.len());
            self.bind(id, &net.bits)?;
            self.wire_attributes(name, net)?;
        }

        for (name, cell) in &json.cells {
            let mut connections = Vec::with_capacity(cell.connections.len());
            for (port, bits) in &cell.connections {
                connections.push((port, self.sig(bits)?));
            }
            let mut directions = Vec::with_capacity(cell.port_directions.len());
            for (port, dir) in &cell.port_directions {
                directions.push((port, self.direction(dir)?));
            }
            let mut parameters = Vec::with_capacity(cell.parameters.len());
            for (k, v) in &cell.parameters {
                parameters.push((k, self.constant(v)?));
            }
            let mut attributes = Vec::with_capacity(cell.attributes.len());
            for (k, v) in &cell.attributes {
                attributes.push((k, self.constant(v)?));
            }

            let target = self.module.add_cell(name, &cell.ty);
            for (port, sig) in connections {
                target.set_port(port.as_str(), sig);
            }
            for (port, dir) in directions {
                target.port_directions.insert(port.clone(), dir);
            }
            for (k, v) in parameters {
                target.set_param(k.as_str(), v);
            }
            for (k, v) in attributes {
                target.set_attr(k.as_str(), v);
            }
        }

        for process in &json.processes {
            self.module.add_process(process);
        }

        Ok(self.module)
    }

    fn bind(&mut self, wire: WireId, bits: &[JsonBit]) -> Result<(), ImportError> {
        for (offset, bit) in bits.iter().enumerate() {
            let this = SigBit::wire(wire, offset);
            match bit {
                JsonBit::Id(id) => match self.bits.get(id) {
                    Some(first) => self.module.connect(vec![this], vec![*first]),
                    None => {
                        self.bits.insert(*id, this);
                    },
                },
                JsonBit::Const(s) => {
                    let state = self.state(s)?;
                    self.module.connect(vec![this], vec![SigBit::Const(state)]);
                },
            }
        }
        Ok(())
    }

    fn sig(&mut self, bits: &[JsonBit]) -> Result<SigSpec, ImportError> {
        bits.iter()
            .map(|bit| match bit {
                JsonBit::Id(id) => Ok(self.id_bit(*id)),
                JsonBit::Const(s) => self.state(s).map(SigBit::Const),
            })
            .collect()
    }

    fn id_bit(&mut self, id: u64) -> SigBit {
        if let Some(bit) = self.bits.get(&id) {
            return *bit;
        }
        let wire = self.module.add_wire(&format!("$sig${id}"), 1);
        let bit = SigBit::wire(wire, 0);
        self.bits.insert(id, bit);
        bit
    }

    fn wire_attributes(&mut self, name: &str, net: &JsonNet) -> Result<(), ImportError> {
        let mut attributes = IndexMap::new();
        for (k, v) in &net.attributes {
            attributes.insert(k.clone(), self.constant(v)?);
        }
        if let Some(wire) = self.module.wire_mut(name) {
            wire.attributes = attributes;
        }
        Ok(())
    }

    fn state(&self, s: &str) -> Result<State, ImportError> {
        let mut chars = s.chars();
        match (chars.next().and_then(State::from_char), chars.next()) {
            (Some(state), None) => Ok(state),
            _ => Err(ImportError::BadBit {
                module: self.module.name.clone(),
                bit: s.to_string(),
            }),
        }
    }

    fn direction(&self, dir: &str) -> Result<PortDirection, ImportError> {
        match dir {
            "input" => Ok(PortDirection::Input),
            "output" => Ok(PortDirection::Output),
            "inout" => Ok(PortDirection::Inout),
            other => Err(ImportError::BadDirection {
                module: self.module.name.clone(),
                direction: other.to_string(),
            }),
        }
    }

    fn constant(&self, value: &Value) -> Result<Const, ImportError> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(match i32::try_from(i) {
                        Ok(v) => Const::from_int(v),
                        Err(_) => wide_int(i as u64),
                    });
                }
                n.as_u64().map(wide_int).ok_or_else(|| self.bad_const(value))
            },
            Value::String(s) => Ok(parse_const_string(s)),
            _ => Err(self.bad_const(value)),
        }
    }

    fn bad_const(&self, value: &Value) -> ImportError {
        ImportError::BadConst {
            module: self.module.name.clone(),
            value: value.to_string(),
        }
    }
}

/// Integers outside the 32-bit range keep all 64 bits.
fn wide_int(raw: u64) -> Const {
    Const::Bits(
        (0..64)
            .map(|i| if (raw >> i) & 1 == 1 { State::S1 } else { State::S0 })
            .collect(),
    )
}

fn is_bit_char(c: char) -> bool {
    matches!(c, '0' | '1' | 'x' | 'z')
}

/// Yosys writes bit vectors as plain `01xz` strings and appends one space to
/// string values that would otherwise read as bit vectors.
fn parse_const_string(s: &str) -> Const {
    let looks_like_bits = s.trim_end_matches(' ').chars().all(is_bit_char);
    if looks_like_bits && s.ends_with(' ') {
        return Const::Str(s[..s.len() - 1].to_string());
    }
    if !s.is_empty() && looks_like_bits {
        if let Some(c) = Const::from_bit_string(s) {
            return c;
        }
    }
    Const::Str(s.to_string())
}
