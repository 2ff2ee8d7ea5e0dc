use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id_string::unescape_id;

/// Runtime configuration of one query.
///
/// Names may be given in escaped yosys form (`\A`); [`Config::normalized`]
/// strips the escape so they line up with the data model.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub pat_filename: String,
    pub pat_module_name: String,

    pub verbose: bool,
    pub const_ports: bool,
    pub nodefaultswaps: bool,
    pub compat_pairs: Vec<CompatPair>,
    pub swap_ports: Vec<SwapPort>,
    pub perm_ports: Vec<PermPort>,
    pub cell_attr: Vec<String>,
    pub wire_attr: Vec<String>,
    pub ignore_parameters: bool,
    pub ignore_param: Vec<IgnoreParam>,
    /// JSON file of `{ module: { signal: pattern } }` entries.
    pub regex_map: Option<PathBuf>,
    /// Fan-out cap applied to the needle graph only.
    pub max_fanout: Option<usize>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatPair {
    pub needle: String,
    pub haystack: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapPort {
    pub type_name: String,
    pub ports: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermPort {
    pub type_name: String,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IgnoreParam {
    pub type_name: String,
    pub param_name: String,
}

impl CompatPair {
    pub fn new(needle: impl Into<String>, haystack: impl Into<String>) -> Self {
        CompatPair {
            needle: needle.into(),
            haystack: haystack.into(),
        }
    }
}

impl SwapPort {
    pub fn new<S: Into<String>>(type_name: impl Into<String>, ports: impl IntoIterator<Item = S>) -> Self {
        SwapPort {
            type_name: type_name.into(),
            ports: ports.into_iter().map(Into::into).collect(),
        }
    }
}

impl PermPort {
    pub fn new<S: Into<String>>(
        type_name: impl Into<String>,
        left: impl IntoIterator<Item = S>,
        right: impl IntoIterator<Item = S>,
    ) -> Self {
        PermPort {
            type_name: type_name.into(),
            left: left.into_iter().map(Into::into).collect(),
            right: right.into_iter().map(Into::into).collect(),
        }
    }
}

impl IgnoreParam {
    pub fn new(type_name: impl Into<String>, param_name: impl Into<String>) -> Self {
        IgnoreParam {
            type_name: type_name.into(),
            param_name: param_name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn norm(name: &str) -> String {
    unescape_id(name).to_string()
}

fn norm_all(names: &[String]) -> Vec<String> {
    names.iter().map(|n| norm(n)).collect()
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Config =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(cfg.normalized())
    }

    /// Strip the RTLIL escape from every name in the configuration.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.pat_module_name = norm(&self.pat_module_name);
        for pair in &mut self.compat_pairs {
            pair.needle = norm(&pair.needle);
            pair.haystack = norm(&pair.haystack);
        }
        for swap in &mut self.swap_ports {
            swap.type_name = norm(&swap.type_name);
            swap.ports = norm_all(&swap.ports);
        }
        for perm in &mut self.perm_ports {
            perm.type_name = norm(&perm.type_name);
            perm.left = norm_all(&perm.left);
            perm.right = norm_all(&perm.right);
        }
        self.cell_attr = norm_all(&self.cell_attr);
        self.wire_attr = norm_all(&self.wire_attr);
        for ignored in &mut self.ignore_param {
            ignored.type_name = norm(&ignored.type_name);
            ignored.param_name = norm(&ignored.param_name);
        }
        self
    }
}
