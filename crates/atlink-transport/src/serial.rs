//! Serial port transport for AT modules.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for USB-UART bridges (CP210x, CH340, FTDI) and
//! native UARTs.
//!
//! Typical module settings:
//! - Espressif ESP32 / ESP8266 AT firmware: 115200 baud, 8N1
//! - MX01 BLE modules: 9600 baud, 8N1
//!
//! # Example
//!
//! ```no_run
//! use atlink_transport::SerialTransport;
//! use atlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> atlink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! transport.send(b"AT+NAME?\r\n").await?;
//!
//! // One bounded read; the engine calls this repeatedly until its deadline.
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_millis(50)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial port configuration.
///
/// Defaults match the factory setting of every supported module:
/// - 8 data bits
/// - 1 stop bit
/// - No parity
/// - No flow control
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (e.g., 9600, 115200)
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1)
    pub stop_bits: StopBits,
    /// Parity checking (typically None)
    pub parity: Parity,
    /// Flow control (None unless the module's RTS/CTS pins are wired)
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => tokio_serial::DataBits::Five,
            DataBits::Six => tokio_serial::DataBits::Six,
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Accepts the single-letter forms used in port settings strings
/// (`N`, `O`, `E`) as well as the full names.
impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "N" | "NONE" => Ok(Parity::None),
            "O" | "ODD" => Ok(Parity::Odd),
            "E" | "EVEN" => Ok(Parity::Even),
            other => Err(Error::InvalidParameter(format!("unknown parity {other:?}"))),
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

/// Serial port transport for AT modules.
pub struct SerialTransport {
    port: Option<SerialStream>,
    /// Port name for logging
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and 8N1 settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (e.g., 9600, 115200)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    ///
    /// ```no_run
    /// # use atlink_transport::{SerialTransport, SerialConfig, Parity};
    /// # async fn example() -> atlink_core::Result<()> {
    /// let config = SerialConfig {
    ///     baud_rate: 9600,
    ///     parity: Parity::None,
    ///     ..Default::default()
    /// };
    /// let transport = SerialTransport::open_with_config("COM3", config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let mut serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        // ESP32/ESP8266 dev boards wire DTR/RTS through the auto-program
        // circuit to EN and GPIO0. Leaving them asserted holds the chip in
        // reset or drops it into the ROM bootloader, and the AT firmware
        // never answers.
        if let Err(e) = serial_stream.write_data_terminal_ready(false) {
            tracing::warn!(port = %port, error = %e, "Failed to de-assert DTR");
        }
        if let Err(e) = serial_stream.write_request_to_send(false) {
            tracing::warn!(port = %port, error = %e, "Failed to de-assert RTS");
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened successfully");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Broken pipes and vanished devices mean the adapter was unplugged.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::UnexpectedEof => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?String::from_utf8_lossy(data),
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            map_io_error(e)
        })?;

        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            map_io_error(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?String::from_utf8_lossy(&buf[..n]),
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::Timeout),
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn test_parity_from_str() {
        assert_eq!("N".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("e".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("Odd".parse::<Parity>().unwrap(), Parity::Odd);
        assert!(matches!(
            "X".parse::<Parity>(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_io_error_mapping() {
        let lost = map_io_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(lost, Error::ConnectionLost));

        let other = map_io_error(std::io::Error::new(std::io::ErrorKind::Other, "weird"));
        assert!(matches!(other, Error::Io(_)));
    }

    #[test]
    fn test_line_settings_conversion() {
        let _: tokio_serial::DataBits = DataBits::Seven.into();
        let _: tokio_serial::StopBits = StopBits::Two.into();
        let _: tokio_serial::Parity = Parity::Even.into();
        let _: tokio_serial::FlowControl = FlowControl::Hardware.into();
    }

    #[tokio::test]
    async fn open_missing_port_is_transport_error() {
        let result = SerialTransport::open("/dev/atlink-no-such-port", 9600).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
