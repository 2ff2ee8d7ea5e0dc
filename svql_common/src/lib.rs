//! Common utilities and shared types for the SVQL workspace.
//!
//! This crate provides the netlist data model, yosys import, query
//! configuration and the match records reported back to callers.

pub mod design;
pub mod id_string;
pub mod matches;
pub mod pattern;
pub mod regex_map;
pub mod source;
pub mod yosys;

mod config;

pub use crate::config::*;
pub use crate::matches::*;
pub use crate::pattern::Pattern;
pub use crate::regex_map::{RegexEntry, RegexMap, RegexMapError};
pub use crate::source::{SourceLoc, SourceRange};
pub use crate::yosys::{import_design, import_json, ImportError, ImportOptions};
