//! Output-signal name constraints.
//!
//! A regex map is loaded from a JSON object of the form
//! `{ "module": { "signal": "pattern" } }`. During matching, a needle cell of
//! `module` whose output drives `signal` may only pair with a haystack cell
//! whose corresponding output wire name matches `pattern`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::id_string::unescape_id;

#[derive(Debug, Error)]
pub enum RegexMapError {
    #[error("cannot open regex map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed regex map: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern for {module}.{signal}: {source}")]
    Pattern {
        module: String,
        signal: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled pattern together with its source text.
#[derive(Debug, Clone)]
pub struct RegexEntry {
    pub regex: Regex,
    pub pattern: String,
}

impl RegexEntry {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            pattern: pattern.to_string(),
        })
    }

    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for RegexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for RegexEntry {}

/// Module name to signal name to pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexMap {
    entries: BTreeMap<String, BTreeMap<String, RegexEntry>>,
}

impl RegexMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegexMapError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RegexMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: BTreeMap<String, BTreeMap<String, String>> =
            serde_json::from_reader(BufReader::new(file))?;
        Self::from_patterns(raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegexMapError> {
        let raw: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(json)?;
        Self::from_patterns(raw)
    }

    fn from_patterns(raw: BTreeMap<String, BTreeMap<String, String>>) -> Result<Self, RegexMapError> {
        let mut map = Self::new();
        for (module, signals) in raw {
            for (signal, pattern) in signals {
                map.insert(&module, &signal, &pattern)?;
            }
        }
        Ok(map)
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, module: &str, signal: &str, pattern: &str) -> Result<(), RegexMapError> {
        let entry = RegexEntry::new(pattern).map_err(|source| RegexMapError::Pattern {
            module: module.to_string(),
            signal: signal.to_string(),
            source,
        })?;
        self.entries
            .entry(unescape_id(module).to_string())
            .or_default()
            .insert(unescape_id(signal).to_string(), entry);
        Ok(())
    }

    /// Merge `other` into `self`; entries of `other` win per signal.
    pub fn join(&mut self, other: RegexMap) {
        for (module, signals) in other.entries {
            self.entries.entry(module).or_default().extend(signals);
        }
    }

    /// Signal patterns registered for a module.
    #[must_use]
    pub fn module(&self, module: &str) -> Option<&BTreeMap<String, RegexEntry>> {
        self.entries.get(unescape_id(module))
    }

    #[must_use]
    pub fn get(&self, module: &str, signal: &str) -> Option<&RegexEntry> {
        self.module(module)?.get(unescape_id(signal))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_lookup() {
        let map = RegexMap::from_json_str(r#"{ "adder": { "\\Y": "^sum_.*" } }"#).unwrap();
        let entry = map.get("\\adder", "Y").unwrap();
        assert!(entry.is_match("sum_42"));
        assert!(!entry.is_match("carry_1"));
        assert!(map.get("adder", "CO").is_none());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = RegexMap::from_json_str(r#"{ "m": { "Y": "(" } }"#).unwrap_err();
        assert!(matches!(err, RegexMapError::Pattern { ref signal, .. } if signal == "Y"));
    }

    #[test]
    fn join_overrides_per_signal() {
        let mut a = RegexMap::from_json_str(r#"{ "m": { "Y": "a", "Q": "q" } }"#).unwrap();
        let b = RegexMap::from_json_str(r#"{ "m": { "Y": "b" } }"#).unwrap();
        a.join(b);
        assert_eq!(a.get("m", "Y").unwrap().pattern, "b");
        assert_eq!(a.get("m", "Q").unwrap().pattern, "q");
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            RegexMap::from_json_file("/nonexistent/regex.json"),
            Err(RegexMapError::Io { .. })
        ));
    }
}
