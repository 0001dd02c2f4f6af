//! # atlink -- AT command transactions for serial radio modules
//!
//! `atlink` is an asynchronous Rust library for talking to Wi-Fi and BLE
//! modules (Espressif ESP32/ESP8266 AT firmware, MX01 BLE bridges) over a
//! UART. It turns "write a command, read until the module is done" into a
//! single call that returns the response lines, with the module's echo
//! already stripped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use atlink::{AtDeviceBuilder, models::esp32_wroom};
//!
//! #[tokio::main]
//! async fn main() -> atlink::Result<()> {
//!     let device = AtDeviceBuilder::new(esp32_wroom())
//!         .serial_port("/dev/ttyUSB0")
//!         .flush_on_open(true)
//!         .build()
//!         .await?;
//!
//!     let resp = device.command("AT+GMR").await?;
//!     for line in &resp.lines {
//!         println!("{line}");
//!     }
//!     device.close().await
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                 | Purpose                                          |
//! |-----------------------|--------------------------------------------------|
//! | `atlink-core`         | [`Transport`] trait, [`Command`], [`AtResponse`], errors |
//! | `atlink-transport`    | Serial port transport                            |
//! | `atlink-engine`       | Frame accumulation, echo strategies, line parsing |
//! | `atlink-device`       | [`AtDevice`], builder, models, command catalog   |
//! | **`atlink`**          | This facade crate -- re-exports everything       |
//!
//! ## Errors
//!
//! Every failure is an [`Error`], and [`Error::kind`] sorts it into one of
//! a handful of [`ErrorKind`]s. `EchoMismatch`, `DeadlineExceeded`, and
//! `Overflow` usually mean the line is out of step with the command
//! stream: call [`AtDevice::flush`] and try again.

pub use atlink_core::*;

pub use atlink_device::{AtDevice, AtDeviceBuilder, DeviceModel, builder, commands, models};

/// The transaction engine: accumulation, echo matching, and line splitting.
///
/// Most applications only need [`AtDevice`]; the engine is exposed for
/// custom transports and alternative device front ends.
pub mod engine {
    pub use atlink_engine::*;
}

/// Serial port transport.
pub mod transport {
    pub use atlink_transport::*;
}

/// Returns every supported module model.
///
/// ```
/// for model in atlink::supported_models() {
///     println!("{} {} ({} baud)", model.vendor, model.name, model.default_baud_rate);
/// }
/// ```
pub fn supported_models() -> Vec<DeviceModel> {
    models::all_models()
}
