use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::id_string::{parse_idstring, IdString, IdStringError};
use crate::source::SourceLoc;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchList {
    pub matches: Vec<QueryMatch>,
}

/// One embedding of the needle in a haystack module.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMatch {
    pub haystack_module: String,
    /// Needle boundary port wire to haystack wire.
    pub port_map: Vec<StringPair>,
    pub cell_map: Vec<CellPair>,
    /// Source locations of the haystack cells, in `cell_map` order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceLoc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
pub struct CellData {
    pub cell_name: String,
    pub cell_index: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct StringPair {
    pub needle: String,
    pub haystack: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct CellPair {
    pub needle: CellData,
    pub haystack: CellData,
}

impl CellData {
    pub fn new(cell_name: impl Into<String>, cell_index: usize) -> Self {
        Self {
            cell_name: cell_name.into(),
            cell_index,
        }
    }

    /// The cell name decomposed into its yosys parts.
    pub fn id_string(&self) -> Result<IdString, IdStringError> {
        parse_idstring(&self.cell_name)
    }
}

impl StringPair {
    pub fn new(needle: impl Into<String>, haystack: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            haystack: haystack.into(),
        }
    }
}

impl Display for CellData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.cell_name, self.cell_index)
    }
}

impl Display for QueryMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let port_map: Vec<String> = self
            .port_map
            .iter()
            .map(|p| format!("{} -> {}", p.needle, p.haystack))
            .collect();
        let cell_map: Vec<String> = self
            .cell_map
            .iter()
            .map(|p| format!("{} -> {}", p.needle, p.haystack))
            .collect();
        write!(
            f,
            "Module: {}\nPort Map: [{}]\nCell Map: [{}]",
            self.haystack_module,
            port_map.join(", "),
            cell_map.join(", ")
        )
    }
}

impl Display for MatchList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, m) in self.matches.iter().enumerate() {
            writeln!(f, "Match #{i}")?;
            writeln!(f, "{m}")?;
        }
        Ok(())
    }
}

impl MatchList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Extend<QueryMatch> for MatchList {
    fn extend<T: IntoIterator<Item = QueryMatch>>(&mut self, iter: T) {
        self.matches.extend(iter);
    }
}
