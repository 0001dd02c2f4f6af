//! atlink-test-harness: Test utilities and mock transports for atlink.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! transaction engine and device drivers without a radio module attached.
//! Replies are scripted as [`Reply`] values: a sequence of byte chunks,
//! each delivered after a delay, optionally followed by a disconnect.

pub mod mock_serial;

pub use mock_serial::{MockTransport, Reply};
