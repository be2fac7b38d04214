#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` carries the ambient stack shared by every version-store crate
//! (§4.K): the error taxonomy, path-safety validation, monotone version
//! timestamps, agent start-up configuration, and the `BaselineProvider`
//! seam that breaks the catalog/pipeline/restore cycle. It has no
//! knowledge of hashing, encryption, or storage layout; those live in
//! their own crates and depend on this one, not the reverse.
//!
//! # See also
//!
//! - [`error`] for the `Result`/`Error` types every fallible operation
//!   in the workspace returns.
//! - [`config`] for the agent's three ambient start-up inputs.
//! - [`baseline`] for the delta-sync baseline abstraction.

pub mod baseline;
pub mod config;
pub mod error;
pub mod path;
pub mod timestamp;

pub use baseline::BaselineProvider;
pub use config::AgentConfig;
pub use error::{Error, ErrorKind, Result};
pub use timestamp::{
    civil_from_days, days_from_civil, parse as parse_timestamp, TimestampSource,
};
