//! Unique identifiers for loaded designs.
//!
//! A `DriverKey` identifies a design by its file path and the module it is
//! loaded for. Keys index the driver's cache so a file is imported once.

use std::path::{Path, PathBuf};

use contracts::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverKey {
    /// Netlist file (Verilog, SystemVerilog, RTLIL or yosys JSON).
    pub path: PathBuf,
    /// Module the design was loaded for, unescaped.
    pub module_name: String,
}

impl DriverKey {
    #[requires(!module_name.as_ref().is_empty())]
    pub fn new<P, S>(path: P, module_name: S) -> Self
    where
        P: Into<PathBuf>,
        S: AsRef<str> + Into<String>,
    {
        let module_name: String = module_name.into();
        Self {
            path: path.into(),
            module_name: svql_common::id_string::unescape_id(&module_name).to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_and_plain_names_are_one_key() {
        assert_eq!(DriverKey::new("a.v", "\\top"), DriverKey::new("a.v", "top"));
        assert_ne!(DriverKey::new("a.v", "top"), DriverKey::new("b.v", "top"));
    }
}
