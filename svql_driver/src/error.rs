use std::path::PathBuf;

use svql_common::{ImportError, RegexMapError};
use svql_subgraph::{Rejection, SolverError};
use thiserror::Error;

use crate::DriverKey;

/// Why a query could not run. An empty match list is not an error.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The configuration names no pattern module.
    #[error("no pattern module given")]
    MissingPattern,
    /// The pattern module is not in the needle design.
    #[error("module {0} not found")]
    ModuleNotFound(String),
    /// The needle module could not be turned into a graph.
    #[error("cannot convert needle module {module}: {reason}")]
    NeedleConversion {
        /// Needle module name.
        module: String,
        /// Why graph conversion refused it.
        reason: Rejection,
    },
    /// A configured port permutation is malformed.
    #[error("invalid port permutation for {type_name}: {reason}")]
    InvalidPermutation {
        /// Cell type of the permutation.
        type_name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The regex map file could not be loaded.
    #[error(transparent)]
    RegexMap(#[from] RegexMapError),
    /// A design could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// Graph registration failed.
    #[error(transparent)]
    Solver(SolverError),
}

impl From<SolverError> for QueryError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::InvalidPermutation { type_name, reason } => {
                QueryError::InvalidPermutation { type_name, reason }
            },
            other => QueryError::Solver(other),
        }
    }
}

/// Failures of the caching [`Driver`](crate::Driver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver root could not be resolved.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Import of a design file failed.
    #[error("Design loading error: {0}")]
    DesignLoading(#[from] ImportError),
    /// The loaded design has no module of the key's name.
    #[error("Design {} does not contain module {}", .0.path.display(), .0.module_name)]
    MissingModule(DriverKey),
    /// A query named a key that was never loaded.
    #[error("Design not loaded: {0:?}")]
    NotLoaded(DriverKey),
    /// The query itself failed.
    #[error(transparent)]
    Query(#[from] QueryError),
}
