//! atlink-core: Core traits, types, and error definitions for atlink.
//!
//! This crate defines the vendor-agnostic pieces shared by every atlink
//! crate. Device drivers, the transaction engine, and applications depend
//! on these types without pulling in a serial port implementation.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level half-duplex channel to a radio module
//! - [`Command`] -- an AT command in its exact wire form
//! - [`AtResponse`] -- the ordered response lines of one transaction
//! - [`Error`] / [`Result`] -- error handling, classified by [`ErrorKind`]

pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use atlink_core::*`.
pub use error::{Error, ErrorKind, Result};
pub use transport::Transport;
pub use types::{AtResponse, Command, FINAL_STATUS_LINES, LINE_TERMINATOR, is_final_status};
