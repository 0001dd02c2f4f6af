//! Transport trait for module communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a radio
//! module. The real implementation is a serial port (`atlink-transport`);
//! tests use the scripted `MockTransport` from `atlink-test-harness`.
//!
//! The transaction engine in `atlink-engine` operates on a `Transport`
//! rather than directly on a serial port, which is what makes its
//! timeout handling testable without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to an AT module.
///
/// The link is half-duplex from the protocol's point of view: one command
/// is written, then its reply is read back. Implementations only move
/// bytes; echo handling and line splitting happen in the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the module.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying device. A partial write is reported as an error.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the module into the provided buffer.
    ///
    /// Waits up to `timeout` for data. Returns the number of bytes read,
    /// which may be zero. Returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing arrived within `timeout`; callers treat that as "no data
    /// yet", not as a failure of the link.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
