//! AtDeviceBuilder -- fluent builder for constructing [`AtDevice`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters, timeouts, and the echo strategy before the port is
//! opened.
//!
//! # Example
//!
//! ```no_run
//! use atlink_device::builder::AtDeviceBuilder;
//! use atlink_device::models::mx01;
//! use std::time::Duration;
//!
//! # async fn example() -> atlink_core::Result<()> {
//! let device = AtDeviceBuilder::new(mx01())
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .command_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::debug;

use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;
use atlink_engine::{EchoStrategy, EngineConfig, StopCondition, TransactionEngine};

use crate::device::AtDevice;
use crate::models::DeviceModel;

/// Fluent builder for [`AtDevice`].
///
/// Every knob defaults to the value in the [`DeviceModel`], so the
/// simplest usage is:
///
/// ```ignore
/// let device = AtDeviceBuilder::new(esp32_wroom())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct AtDeviceBuilder {
    model: DeviceModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    command_timeout: Duration,
    read_window: Duration,
    frame_capacity: usize,
    echo: EchoStrategy,
    stop: StopCondition,
    flush_on_open: bool,
}

impl AtDeviceBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: DeviceModel) -> Self {
        AtDeviceBuilder {
            serial_port: None,
            baud_rate: None,
            command_timeout: model.command_timeout,
            read_window: model.read_window,
            frame_capacity: model.frame_capacity,
            echo: model.echo,
            stop: StopCondition::default(),
            flush_on_open: false,
            model,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Set the deadline used by [`AtDevice::command`].
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the upper bound on a single read while a reply accumulates.
    pub fn read_window(mut self, window: Duration) -> Self {
        self.read_window = window;
        self
    }

    /// Set the largest reply the device will buffer, echo included.
    pub fn frame_capacity(mut self, capacity: usize) -> Self {
        self.frame_capacity = capacity;
        self
    }

    /// Override the model's echo strategy, e.g. after sending `ATE0`
    /// nothing is echoed and a field echo may fit better.
    pub fn echo_strategy(mut self, echo: EchoStrategy) -> Self {
        self.echo = echo;
        self
    }

    /// Choose whether accumulation may end at the first final status line
    /// ([`StopCondition::FinalStatus`]) or always runs to the deadline
    /// ([`StopCondition::Deadline`], the default).
    pub fn stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// Flush stray output (boot banners) right after the device is built.
    pub fn flush_on_open(mut self, enabled: bool) -> Self {
        self.flush_on_open = enabled;
        self
    }

    /// Build an [`AtDevice`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `atlink-test-harness`) and for callers that open the link
    /// themselves.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<AtDevice> {
        if self.command_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "command_timeout must be greater than zero".into(),
            ));
        }
        if self.read_window.is_zero() {
            return Err(Error::InvalidParameter(
                "read_window must be greater than zero".into(),
            ));
        }
        if self.frame_capacity == 0 {
            return Err(Error::InvalidParameter(
                "frame_capacity must be greater than zero".into(),
            ));
        }

        debug!(
            model = self.model.name,
            echo = ?self.echo,
            stop = ?self.stop,
            timeout = ?self.command_timeout,
            "building device"
        );

        let engine = TransactionEngine::new(EngineConfig {
            echo: self.echo,
            frame_capacity: self.frame_capacity,
            read_window: self.read_window,
            stop: self.stop,
        });
        let device = AtDevice::new(transport, self.model, engine, self.command_timeout);

        if self.flush_on_open {
            device.flush().await?;
        }
        Ok(device)
    }

    /// Build an [`AtDevice`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's if not overridden.
    pub async fn build(self) -> Result<AtDevice> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let transport = atlink_transport::SerialTransport::open(port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{esp32_wroom, esp8266, mx01};
    use atlink_test_harness::{MockTransport, Reply};

    #[tokio::test]
    async fn builder_defaults_follow_model() {
        let device = AtDeviceBuilder::new(mx01())
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(device.model().name, "MX01");
        assert_eq!(device.command_timeout(), Duration::from_millis(200));
        let config = device.engine().config();
        assert_eq!(config.echo, EchoStrategy::field_echo());
        assert_eq!(config.frame_capacity, 256);
        assert_eq!(config.stop, StopCondition::Deadline);
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let device = AtDeviceBuilder::new(esp8266())
            .serial_port("/dev/ttyUSB0")
            .baud_rate(9600)
            .command_timeout(Duration::from_millis(1000))
            .read_window(Duration::from_millis(20))
            .frame_capacity(1024)
            .echo_strategy(EchoStrategy::field_echo())
            .stop_condition(StopCondition::FinalStatus)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(device.command_timeout(), Duration::from_millis(1000));
        let config = device.engine().config();
        assert_eq!(config.read_window, Duration::from_millis(20));
        assert_eq!(config.frame_capacity, 1024);
        assert_eq!(config.echo, EchoStrategy::field_echo());
        assert_eq!(config.stop, StopCondition::FinalStatus);
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = AtDeviceBuilder::new(esp32_wroom()).build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_rejects_zero_settings() {
        let zero_timeout = AtDeviceBuilder::new(esp32_wroom())
            .command_timeout(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(zero_timeout, Err(Error::InvalidParameter(_))));

        let zero_window = AtDeviceBuilder::new(esp32_wroom())
            .read_window(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(zero_window, Err(Error::InvalidParameter(_))));

        let zero_capacity = AtDeviceBuilder::new(esp32_wroom())
            .frame_capacity(0)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(zero_capacity, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_on_open_propagates_transport_failure() {
        let mut mock = MockTransport::new();
        mock.push_unsolicited(Reply::new().disconnect_after(Duration::ZERO));
        let result = AtDeviceBuilder::new(esp32_wroom())
            .flush_on_open(true)
            .build_with_transport(Box::new(mock))
            .await;
        assert!(matches!(result, Err(Error::ConnectionLost)));
    }

    #[tokio::test]
    async fn builder_keeps_very_long_timeout() {
        let timeout = Duration::from_secs(u64::MAX);
        let device = AtDeviceBuilder::new(esp32_wroom())
            .command_timeout(timeout)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();
        assert_eq!(device.command_timeout(), timeout);
    }
}
