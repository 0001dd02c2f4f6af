//! AtDevice -- one module on one transport.
//!
//! The transport lives in a shared `Mutex<Option<..>>` slot.
//! [`transact()`](AtDevice::transact) and [`flush()`](AtDevice::flush)
//! hold the lock for their whole duration, so two tasks sharing an
//! `Arc<AtDevice>` never interleave bytes on the wire. A transaction's
//! reader task owns the lock until its deadline even if the caller gives
//! up first. An empty slot means the device was closed, or a reader task
//! died and took the transport with it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;
use atlink_core::{AtResponse, Command};
use atlink_engine::frame;
use atlink_engine::{TransactionEngine, TransportSlot, transport_slot};

use crate::models::DeviceModel;

/// Per-read wait while flushing.
pub const FLUSH_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Upper bound on a whole flush, for a line that never goes quiet.
pub const FLUSH_BUDGET: Duration = Duration::from_millis(500);

/// A connected AT-command module.
///
/// Constructed through [`AtDeviceBuilder`](crate::AtDeviceBuilder).
pub struct AtDevice {
    transport: TransportSlot,
    engine: TransactionEngine,
    model: DeviceModel,
    command_timeout: Duration,
}

impl AtDevice {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        model: DeviceModel,
        engine: TransactionEngine,
        command_timeout: Duration,
    ) -> Self {
        AtDevice {
            transport: transport_slot(transport),
            engine,
            model,
            command_timeout,
        }
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    /// The deadline [`command()`](Self::command) uses.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    /// Run one transaction with an explicit deadline.
    ///
    /// Waits for any transaction already in progress on this device.
    pub async fn transact(&self, command: &Command, timeout: Duration) -> Result<AtResponse> {
        let slot = Arc::clone(&self.transport).lock_owned().await;
        let result = self.engine.transact(slot, command, timeout).await;
        if let Ok(resp) = &result {
            debug!(command = %command, lines = resp.lines.len(), "transaction complete");
        }
        result
    }

    /// Send `text` as a command with the device's default timeout.
    pub async fn command(&self, text: &str) -> Result<AtResponse> {
        self.transact(&Command::new(text), self.command_timeout).await
    }

    /// Discard whatever the module has sent that nobody asked for.
    ///
    /// Reads with a 10 ms window until one read comes back empty, or
    /// 500 ms have passed. Returns the number of bytes thrown away.
    pub async fn flush(&self) -> Result<usize> {
        let mut slot = self.transport.lock().await;
        let transport = slot.as_mut().ok_or(Error::NotConnected)?;
        let discarded = frame::drain(transport.as_mut(), FLUSH_READ_TIMEOUT, FLUSH_BUDGET).await?;
        if discarded > 0 {
            info!(device = self.model.name, discarded, "flushed stray module output");
        }
        Ok(discarded)
    }

    /// Close the transport. Later calls fail with [`Error::NotConnected`].
    ///
    /// Closing an already-closed device is a no-op.
    pub async fn close(&self) -> Result<()> {
        let taken = self.transport.lock().await.take();
        match taken {
            Some(mut transport) => {
                info!(device = self.model.name, "closing device");
                transport.close().await
            }
            None => Ok(()),
        }
    }

    /// Whether the device still holds a connected transport.
    pub async fn is_open(&self) -> bool {
        self.transport
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_connected())
    }
}
