//! Yosys integration.
//!
//! Designs are read from yosys `write_json` netlists. Verilog and RTLIL
//! sources are first run through a yosys binary into a temporary JSON file.

mod config;
mod design_path;
mod json;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

pub use config::ImportOptions;
pub use design_path::DesignPath;
pub use json::import_json;

use crate::design::Design;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed yosys JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("module {module}: invalid signal bit {bit}")]
    BadBit { module: String, bit: String },
    #[error("module {module}: invalid port direction {direction}")]
    BadDirection { module: String, direction: String },
    #[error("module {module}: invalid constant {value}")]
    BadConst { module: String, value: String },
    #[error("unsupported design file extension: {0}")]
    UnsupportedExtension(PathBuf),
    #[error("yosys not found on path: {0}")]
    YosysNotFound(#[from] which::Error),
    #[error("yosys failed: status={status}\n{stderr}")]
    YosysFailed { status: ExitStatus, stderr: String },
}

impl ImportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load a design from disk. `.json` files are parsed directly, everything
/// else goes through yosys.
#[contracts::debug_requires(!path.as_os_str().is_empty())]
pub fn import_design(path: &Path, options: &ImportOptions) -> Result<Design, ImportError> {
    let design_path = DesignPath::new(path.to_path_buf())?;
    if let DesignPath::Json(p) = &design_path {
        return read_json_file(p);
    }

    let yosys = match &options.yosys {
        Some(y) => y.clone(),
        None => which::which("yosys")?,
    };

    let json_temp_file = tempfile::Builder::new()
        .prefix("svql_")
        .suffix(".json")
        .rand_bytes(4)
        .tempfile()
        .map_err(|e| ImportError::io(path, e))?;

    let args = build_yosys_args(&design_path, json_temp_file.path(), options);
    run_yosys_command(&yosys, args)?;

    read_json_file(json_temp_file.path())
}

fn read_json_file(path: &Path) -> Result<Design, ImportError> {
    let file = File::open(path).map_err(|e| ImportError::io(path, e))?;
    let design = import_json(BufReader::new(file))?;
    tracing::debug!(
        "loaded {} module(s) from {}",
        design.len(),
        path.display()
    );
    Ok(design)
}

fn build_yosys_args(design: &DesignPath, json_out: &Path, options: &ImportOptions) -> Vec<String> {
    let mut args = Vec::new();

    args.push("-p".to_string());
    args.push(format!("{} {}", design.read_command(), design.path().display()));

    args.push("-p".to_string());
    match &options.top {
        Some(top) => args.push(format!("hierarchy -top {top}")),
        None => args.push("hierarchy -auto-top".to_string()),
    }

    args.push("-p".to_string());
    args.push("proc".to_string());

    if options.flatten {
        args.push("-p".to_string());
        args.push("flatten".to_string());
    }

    args.push("-p".to_string());
    args.push("opt_clean".to_string());

    for step in &options.other_steps {
        args.push("-p".to_string());
        args.push(step.clone());
    }

    args.push("-p".to_string());
    args.push(format!("write_json {}", json_out.display()));

    args
}

fn run_yosys_command(yosys: &Path, args: Vec<String>) -> Result<(), ImportError> {
    let output = Command::new(yosys)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ImportError::io(yosys, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::error!("yosys failed: status={:?}\n{}", output.status, stderr);
        return Err(ImportError::YosysFailed {
            status: output.status,
            stderr,
        });
    }
    Ok(())
}
