#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `agent-protocol` is component J of the version store: the
//! newline-delimited JSON wire protocol the daemon speaks over its one
//! connection at a time (§4.J, §5, §6). This crate defines only the
//! wire shapes and the framing that carries them — it has no dependency
//! on `delta`, `catalog`, `pipeline`, or `restore`, so it cannot express
//! the domain operations those commands trigger. The agent binary,
//! which does depend on all of them, converts between [`wire`] types and
//! domain types at the boundary.
//!
//! # See also
//!
//! - [`frame`] for the length-capped, line-delimited I/O.
//! - [`request`] and [`response`] for the command and reply shapes.
//! - [`wire`] for the shared data types those shapes embed.

pub mod error;
pub mod frame;
pub mod request;
pub mod response;
pub mod wire;

pub use error::{ProtocolError, Result};
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
pub use request::Request;
pub use response::{Handshake, Response};
