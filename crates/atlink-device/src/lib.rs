//! Device facade for AT-command radio modules.
//!
//! This crate binds one transport, one echo strategy, and the
//! [`TransactionEngine`](atlink_engine::TransactionEngine) into an
//! [`AtDevice`]. It provides:
//!
//! - **Model definitions** ([`models`]) -- static defaults (baud rate, echo
//!   behavior, timeouts) for the supported modules.
//! - **Builder** ([`builder`]) -- fluent [`AtDeviceBuilder`] that opens the
//!   serial port or accepts any caller-provided transport.
//! - **Device** ([`device`]) -- `transact`, `flush`, and `close`, with one
//!   outstanding transaction per device.
//! - **Command catalog** ([`commands`]) -- command builders and response
//!   interpreters for Espressif AT firmware and the MX01 BLE module.
//!
//! # Example
//!
//! ```no_run
//! use atlink_device::{AtDeviceBuilder, models::esp32_wroom};
//! use atlink_device::commands::espressif;
//!
//! # async fn example() -> atlink_core::Result<()> {
//! let device = AtDeviceBuilder::new(esp32_wroom())
//!     .serial_port("/dev/ttyUSB0")
//!     .flush_on_open(true)
//!     .build()
//!     .await?;
//!
//! espressif::ping(&device).await?;
//! let version = espressif::version(&device).await?;
//! println!("{}", version.at_version);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod device;
pub mod models;

pub use builder::AtDeviceBuilder;
pub use device::AtDevice;
pub use models::DeviceModel;
