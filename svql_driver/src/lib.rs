//! Query orchestration for SVQL.
//!
//! This crate turns a needle module and a haystack design into a
//! [`MatchList`](svql_common::MatchList), and manages loading and caching the
//! designs a query runs on.

pub mod driver;
pub mod error;
pub mod key;
pub mod query;

pub use driver::Driver;
pub use error::{DriverError, QueryError};
pub use key::DriverKey;
pub use query::{build_solver, run_all_needles, run_query};
