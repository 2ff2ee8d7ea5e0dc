//! Netlist data model.
//!
//! An RTLIL-shaped, in-memory view of a synthesized design: modules made of
//! wires and cells, alias connections between signal bits, and the
//! canonicalising [`SigMap`] over them.

pub mod cell;
pub mod module;
pub mod selection;
pub mod sig;
pub mod sigmap;
pub mod wire;

pub use cell::*;
pub use module::*;
pub use selection::*;
pub use sig::*;
pub use sigmap::*;
pub use wire::*;
