//! Netlist graphs and the subgraph isomorphism solver that searches them.
//!
//! [`module_to_graph`] turns a [`svql_common::design::Module`] into a
//! [`Graph`] whose nodes point back at their cells. Graphs are registered with
//! a [`Solver`], which finds every embedding of one graph in another.

pub mod compat;
pub mod conversion;
pub mod graph;
pub mod registry;
pub mod solver;

pub use compat::{CellComparator, CompareOptions, unified_param};
pub use conversion::{BuildOptions, CellRef, Rejection, module_to_graph};
pub use graph::{Graph, Node, NodeId, PinBit};
pub use registry::Registry;
pub use solver::{AcceptAll, NodeComparator, NodeMapping, PortMap, SolveOptions, SolveResult, Solver, SolverError};
