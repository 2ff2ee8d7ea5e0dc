//! Yosys identifier handling.
//!
//! Names inside the data model are stored without the RTLIL escape prefix.
//! Generated names (`$and$file.v:9$11`) keep their `$` and can be decomposed
//! with [`IdString`] for reporting.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of graph ids built from needle modules.
pub const NEEDLE_PREFIX: &str = "needle_";
/// Prefix of graph ids built from haystack modules.
pub const HAYSTACK_PREFIX: &str = "haystack_";

lazy_static! {
    static ref NAMED_IDSTRING_RE: Regex = Regex::new(r"^\\?([^\$\s]\S*)$").unwrap();
    static ref UNNAMED_LOCATION_IDSTRING_RE: Regex =
        Regex::new(r"^\$([^\$]*)\$([^:]*):([^\$]*)\$(.*)$").unwrap();
    static ref UNNAMED_NO_LOCATION_IDSTRING_RE: Regex =
        Regex::new(r"^\$([^\$]*)\$(.*)$").unwrap();
}

/// Strip the RTLIL escape from a user-visible name. Generated names are
/// returned unchanged.
#[must_use]
pub fn unescape_id(name: &str) -> &str {
    name.strip_prefix('\\').unwrap_or(name)
}

/// Graph id of a needle module.
#[must_use]
pub fn needle_graph_id(module: &str) -> String {
    format!("{NEEDLE_PREFIX}{}", unescape_id(module))
}

/// Graph id of a haystack module.
#[must_use]
pub fn haystack_graph_id(module: &str) -> String {
    format!("{HAYSTACK_PREFIX}{}", unescape_id(module))
}

/// Module name behind a graph id produced by [`needle_graph_id`] or
/// [`haystack_graph_id`]. Unknown ids are returned unchanged.
#[must_use]
pub fn strip_graph_prefix(graph_id: &str) -> &str {
    graph_id
        .strip_prefix(NEEDLE_PREFIX)
        .or_else(|| graph_id.strip_prefix(HAYSTACK_PREFIX))
        .unwrap_or(graph_id)
}

/// A decomposed yosys identifier.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub enum IdString {
    // "\\[name]" or a bare user name
    Named(String),
    // $and$rtl/many_ands.v:14$2_Y
    UnnamedLocation {
        gate_name: String,
        file_path: String,
        line: String,
        id: String,
    },
    // $procdff$22
    UnnamedNoLocation {
        gate_name: String,
        id: String,
    },
}

impl IdString {
    /// Whether the identifier was chosen by the user rather than generated.
    #[must_use]
    pub const fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl Display for IdString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdString::Named(name) => write!(f, "{name}"),
            IdString::UnnamedLocation {
                gate_name,
                file_path,
                line,
                id,
            } => {
                write!(f, "${gate_name}${file_path}:{line}${id}")
            },
            IdString::UnnamedNoLocation { gate_name, id } => {
                write!(f, "${gate_name}${id}")
            },
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum IdStringError {
    #[error("malformed identifier: {0}")]
    InvalidFormat(String),
}

impl TryFrom<&str> for IdString {
    type Error = IdStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if let Some(caps) = NAMED_IDSTRING_RE.captures(value) {
            return Ok(IdString::Named(caps[1].to_string()));
        } else if let Some(caps) = UNNAMED_LOCATION_IDSTRING_RE.captures(value) {
            return Ok(IdString::UnnamedLocation {
                gate_name: caps[1].to_string(),
                file_path: caps[2].to_string(),
                line: caps[3].to_string(),
                id: caps[4].to_string(),
            });
        } else if let Some(caps) = UNNAMED_NO_LOCATION_IDSTRING_RE.captures(value) {
            return Ok(IdString::UnnamedNoLocation {
                gate_name: caps[1].to_string(),
                id: caps[2].to_string(),
            });
        }
        Err(IdStringError::InvalidFormat(value.to_string()))
    }
}

pub fn parse_idstring(id_string: &str) -> Result<IdString, IdStringError> {
    IdString::try_from(id_string)
}
