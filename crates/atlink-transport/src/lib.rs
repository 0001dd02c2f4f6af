//! Transport implementations for atlink.
//!
//! This crate provides [`SerialTransport`], the concrete implementation of
//! the [`Transport`](atlink_core::Transport) trait from `atlink-core` for
//! USB-UART bridges and on-board UARTs that AT modules hang off.
//!
//! # Example
//!
//! ```no_run
//! use atlink_transport::SerialTransport;
//! use atlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> atlink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115_200).await?;
//!
//! transport.send(b"AT\r\n").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_millis(50)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
