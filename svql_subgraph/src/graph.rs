//! The abstract node/port/net graph searched by the solver.
//!
//! Every port bit of every node is a pin. Connections merge pins into nets
//! (a union-find over pin ids), so a net is the set of pins that share one
//! signal. Nets may carry an inline constant and may be marked extern when
//! the signal is visible outside the graph.

use std::collections::HashMap;

use contracts::debug_requires;
use svql_common::design::State;

/// Index of a node inside its graph.
pub type NodeId = usize;
/// Index of a net inside a [`NetTable`].
pub type NetId = usize;

/// One bit of one port of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinBit {
    pub node: NodeId,
    pub port: usize,
    pub bit: usize,
}

impl PinBit {
    #[must_use]
    pub const fn new(node: NodeId, port: usize, bit: usize) -> Self {
        Self { node, port, bit }
    }
}

/// A bit-level edge recorded during construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: PinBit,
    pub to: PinBit,
}

/// A named, fixed-width port of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    /// Port name, unique per node.
    pub name: String,
    /// Number of pins.
    pub width: usize,
    first_pin: usize,
}

/// A graph node, typically one cell.
#[derive(Clone, Debug)]
pub struct Node<U> {
    /// Node name, unique per graph.
    pub name: String,
    /// Type tag compared through the registry.
    pub ty: String,
    /// Back-reference to whatever the node was built from.
    pub user_data: Option<U>,
    ports: Vec<Port>,
    port_index: HashMap<String, usize>,
}

impl<U> Node<U> {
    #[must_use]
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    #[must_use]
    pub fn port_id(&self, name: &str) -> Option<usize> {
        self.port_index.get(name).copied()
    }

    #[must_use]
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.port_id(name).map(|p| &self.ports[p])
    }
}

/// A named graph of nodes whose pins are grouped into nets.
#[derive(Clone, Debug)]
pub struct Graph<U> {
    name: String,
    nodes: Vec<Node<U>>,
    node_index: HashMap<String, NodeId>,
    pins: Vec<PinBit>,
    parent: Vec<usize>,
    constants: Vec<Option<State>>,
    externs: Vec<bool>,
    connections: Vec<Connection>,
}

impl<U> Graph<U> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            pins: Vec::new(),
            parent: Vec::new(),
            constants: Vec::new(),
            externs: Vec::new(),
            connections: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // construction
    // ------------------------------------------------------------------

    #[debug_requires(!self.node_index.contains_key(name), "node names are unique")]
    pub fn add_node(&mut self, name: &str, ty: &str, user_data: Option<U>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            ty: ty.to_string(),
            user_data,
            ports: Vec::new(),
            port_index: HashMap::new(),
        });
        self.node_index.insert(name.to_string(), id);
        id
    }

    #[debug_requires(node < self.nodes.len())]
    #[debug_requires(self.nodes[node].port_id(name).is_none(), "port names are unique per node")]
    pub fn add_port(&mut self, node: NodeId, name: &str, width: usize) -> usize {
        let first_pin = self.pins.len();
        let port = self.nodes[node].ports.len();
        for bit in 0..width {
            self.pins.push(PinBit::new(node, port, bit));
            self.parent.push(first_pin + bit);
            self.constants.push(None);
            self.externs.push(false);
        }
        let n = &mut self.nodes[node];
        n.ports.push(Port {
            name: name.to_string(),
            width,
            first_pin,
        });
        n.port_index.insert(name.to_string(), port);
        port
    }

    /// Merge the nets of two pins. Connecting a pin to itself is a no-op.
    pub fn connect(&mut self, from: PinBit, to: PinBit) {
        let a = self.pin_id(from);
        let b = self.pin_id(to);
        if a == b {
            return;
        }
        self.connections.push(Connection { from, to });
        let ra = self.find_mut(a);
        let rb = self.find_mut(b);
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }

    /// Connect two whole ports bit by bit.
    #[debug_requires(self.port_width(a.0, a.1) == self.port_width(b.0, b.1))]
    pub fn connect_ports(&mut self, a: (NodeId, usize), b: (NodeId, usize)) {
        for bit in 0..self.port_width(a.0, a.1) {
            self.connect(PinBit::new(a.0, a.1, bit), PinBit::new(b.0, b.1, bit));
        }
    }

    /// Record an inline constant on a pin.
    pub fn set_constant(&mut self, pin: PinBit, value: State) {
        let id = self.pin_id(pin);
        self.constants[id] = Some(value);
    }

    /// Mark a pin's net as visible outside the graph.
    pub fn mark_extern(&mut self, pin: PinBit) {
        let id = self.pin_id(pin);
        self.externs[id] = true;
    }

    /// Mark every bit of a port extern.
    pub fn mark_port_extern(&mut self, node: NodeId, port: usize) {
        for bit in 0..self.port_width(node, port) {
            self.mark_extern(PinBit::new(node, port, bit));
        }
    }

    // ------------------------------------------------------------------
    // queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn nodes(&self) -> &[Node<U>] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node<U> {
        &self.nodes[id]
    }

    #[must_use]
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[must_use]
    pub fn port_width(&self, node: NodeId, port: usize) -> usize {
        self.nodes[node].ports[port].width
    }

    /// Pin handle for a port bit looked up by name.
    #[must_use]
    pub fn pin(&self, node: &str, port: &str, bit: usize) -> Option<PinBit> {
        let n = self.node_id(node)?;
        let p = self.nodes[n].port_id(port)?;
        (bit < self.port_width(n, p)).then_some(PinBit::new(n, p, bit))
    }

    /// Whether two pins share a net.
    #[must_use]
    pub fn connected(&self, a: PinBit, b: PinBit) -> bool {
        self.find(self.pin_id(a)) == self.find(self.pin_id(b))
    }

    /// Whether any pin of the node lies on an extern net.
    #[must_use]
    pub fn node_is_extern(&self, node: NodeId) -> bool {
        let table = self.net_table();
        self.nodes[node]
            .ports
            .iter()
            .flat_map(|p| p.first_pin..p.first_pin + p.width)
            .any(|pin| table.nets[table.pin_net[pin]].is_extern)
    }

    /// Group pins into nets, in order of each net's lowest pin.
    #[must_use]
    pub fn net_table(&self) -> NetTable {
        let mut root_net: HashMap<usize, NetId> = HashMap::new();
        let mut nets: Vec<Net> = Vec::new();
        let mut pin_net = Vec::with_capacity(self.pins.len());

        for (id, pin) in self.pins.iter().enumerate() {
            let root = self.find(id);
            let net = *root_net.entry(root).or_insert_with(|| {
                nets.push(Net::default());
                nets.len() - 1
            });
            let entry = &mut nets[net];
            entry.pins.push(*pin);
            entry.is_extern |= self.externs[id];
            if entry.constant.is_none() {
                entry.constant = self.constants[id];
            }
            pin_net.push(net);
        }

        let first_pin = self.nodes.iter().map(|n| {
            n.ports.iter().map(|p| p.first_pin).collect::<Vec<_>>()
        });
        NetTable {
            nets,
            pin_net,
            port_first_pin: first_pin.collect(),
        }
    }

    fn pin_id(&self, pin: PinBit) -> usize {
        let port = &self.nodes[pin.node].ports[pin.port];
        debug_assert!(pin.bit < port.width);
        port.first_pin + pin.bit
    }

    fn find(&self, mut id: usize) -> usize {
        while self.parent[id] != id {
            id = self.parent[id];
        }
        id
    }

    fn find_mut(&mut self, id: usize) -> usize {
        let root = self.find(id);
        let mut cur = id;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }
}

/// A set of pins sharing one signal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Net {
    /// Member pins in pin order.
    pub pins: Vec<PinBit>,
    /// Inline constant carried by any member pin.
    pub constant: Option<State>,
    /// Visible outside the graph.
    pub is_extern: bool,
}

/// Frozen net view of a graph.
#[derive(Clone, Debug)]
pub struct NetTable {
    pub nets: Vec<Net>,
    pin_net: Vec<NetId>,
    port_first_pin: Vec<Vec<usize>>,
}

impl NetTable {
    #[must_use]
    pub fn net_of(&self, pin: PinBit) -> NetId {
        self.pin_net[self.port_first_pin[pin.node][pin.port] + pin.bit]
    }

    #[must_use]
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id]
    }
}
