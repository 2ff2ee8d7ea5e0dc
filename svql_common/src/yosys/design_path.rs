//! Handling of design file paths and types.

use std::path::{Path, PathBuf};

use super::ImportError;

/// Represents a path to a design file, categorized by its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DesignPath {
    /// A Verilog file (.v).
    Verilog(PathBuf),
    /// A SystemVerilog file (.sv).
    SystemVerilog(PathBuf),
    /// An RTLIL file (.il).
    Rtlil(PathBuf),
    /// A yosys JSON netlist (.json), loaded without running yosys.
    Json(PathBuf),
}

impl DesignPath {
    pub fn new(path: PathBuf) -> Result<Self, ImportError> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("v") => Ok(DesignPath::Verilog(path)),
            Some("sv") => Ok(DesignPath::SystemVerilog(path)),
            Some("il") => Ok(DesignPath::Rtlil(path)),
            Some("json") => Ok(DesignPath::Json(path)),
            _ => Err(ImportError::UnsupportedExtension(path)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DesignPath::Verilog(p)
            | DesignPath::SystemVerilog(p)
            | DesignPath::Rtlil(p)
            | DesignPath::Json(p) => p,
        }
    }

    pub fn read_command(&self) -> &'static str {
        match self {
            DesignPath::Verilog(_) => "read_verilog",
            DesignPath::SystemVerilog(_) => "read_verilog -sv",
            DesignPath::Rtlil(_) => "read_rtlil",
            DesignPath::Json(_) => "read_json",
        }
    }
}
