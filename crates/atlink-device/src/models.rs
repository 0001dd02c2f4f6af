//! Supported module definitions.
//!
//! Each module is described by a [`DeviceModel`] returned from a factory
//! function. The model seeds [`AtDeviceBuilder`](crate::AtDeviceBuilder)
//! with the module's factory serial settings and the way its firmware
//! echoes commands.
//!
//! | Model        | Vendor    | Baud    | Echo        | Timeout |
//! |--------------|-----------|---------|-------------|---------|
//! | ESP32-WROOM  | Espressif | 115200  | exact       | 300 ms  |
//! | ESP8266      | Espressif | 115200  | exact       | 300 ms  |
//! | MX01         | MX        | 9600    | field (`:`) | 200 ms  |

use std::fmt;
use std::time::Duration;

use atlink_engine::{DEFAULT_FRAME_CAPACITY, EchoStrategy};

/// Module vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Espressif,
    Mx,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Espressif => write!(f, "Espressif"),
            Vendor::Mx => write!(f, "MX"),
        }
    }
}

/// Radio interfaces a module exposes over its AT firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radio {
    Wifi,
    Ble,
}

/// Static definition of an AT-command module.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    /// Human-readable model name (e.g. "ESP32-WROOM").
    pub name: &'static str,
    /// Machine-readable identifier, as accepted on the command line.
    pub model_id: &'static str,
    pub vendor: Vendor,
    pub radios: &'static [Radio],
    /// Factory UART baud rate.
    pub default_baud_rate: u32,
    /// How the firmware echoes commands.
    pub echo: EchoStrategy,
    /// Deadline for one command when the caller does not give one.
    pub command_timeout: Duration,
    /// Upper bound on a single read while a reply accumulates.
    pub read_window: Duration,
    /// Largest reply the driver will buffer, echo included.
    pub frame_capacity: usize,
}

/// ESP32-WROOM module running Espressif AT firmware.
///
/// Echo is on by default (`ATE1`), so every reply starts with the exact
/// command bytes.
pub fn esp32_wroom() -> DeviceModel {
    DeviceModel {
        name: "ESP32-WROOM",
        model_id: "esp32-wroom",
        vendor: Vendor::Espressif,
        radios: &[Radio::Wifi, Radio::Ble],
        default_baud_rate: 115_200,
        echo: EchoStrategy::ExactPrefix,
        command_timeout: Duration::from_millis(300),
        read_window: Duration::from_millis(50),
        frame_capacity: DEFAULT_FRAME_CAPACITY,
    }
}

/// ESP8266 module running Espressif AT firmware. Wi-Fi only.
pub fn esp8266() -> DeviceModel {
    DeviceModel {
        name: "ESP8266",
        model_id: "esp8266",
        vendor: Vendor::Espressif,
        radios: &[Radio::Wifi],
        default_baud_rate: 115_200,
        echo: EchoStrategy::ExactPrefix,
        command_timeout: Duration::from_millis(300),
        read_window: Duration::from_millis(50),
        frame_capacity: DEFAULT_FRAME_CAPACITY,
    }
}

/// MX01 BLE serial module.
///
/// Queries are answered as `+FIELD:value`; set commands get a bare `OK`.
pub fn mx01() -> DeviceModel {
    DeviceModel {
        name: "MX01",
        model_id: "mx01",
        vendor: Vendor::Mx,
        radios: &[Radio::Ble],
        default_baud_rate: 9_600,
        echo: EchoStrategy::field_echo(),
        command_timeout: Duration::from_millis(200),
        read_window: Duration::from_millis(50),
        frame_capacity: DEFAULT_FRAME_CAPACITY,
    }
}

/// Every supported model, in table order.
pub fn all_models() -> Vec<DeviceModel> {
    vec![esp32_wroom(), esp8266(), mx01()]
}

/// Look up a model by `model_id` or name, ignoring ASCII case.
pub fn find_model(id: &str) -> Option<DeviceModel> {
    all_models()
        .into_iter()
        .find(|m| m.model_id.eq_ignore_ascii_case(id) || m.name.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espressif_models_use_exact_echo() {
        for model in [esp32_wroom(), esp8266()] {
            assert_eq!(model.vendor, Vendor::Espressif);
            assert_eq!(model.echo, EchoStrategy::ExactPrefix);
            assert_eq!(model.default_baud_rate, 115_200);
            assert!(model.radios.contains(&Radio::Wifi));
        }
        assert!(!esp8266().radios.contains(&Radio::Ble));
    }

    #[test]
    fn mx01_uses_field_echo() {
        let model = mx01();
        assert_eq!(model.echo, EchoStrategy::FieldEcho { separator: b':' });
        assert_eq!(model.default_baud_rate, 9_600);
        assert_eq!(model.command_timeout, Duration::from_millis(200));
    }

    #[test]
    fn model_ids_are_unique() {
        let models = all_models();
        for (i, a) in models.iter().enumerate() {
            for b in &models[i + 1..] {
                assert_ne!(a.model_id, b.model_id);
            }
        }
    }

    #[test]
    fn find_model_by_id_or_name() {
        assert_eq!(find_model("mx01").map(|m| m.name), Some("MX01"));
        assert_eq!(find_model("ESP32-WROOM").map(|m| m.model_id), Some("esp32-wroom"));
        assert_eq!(find_model("Esp8266").map(|m| m.name), Some("ESP8266"));
        assert!(find_model("esp32-c3").is_none());
    }

    #[test]
    fn frame_capacity_defaults() {
        for model in all_models() {
            assert_eq!(model.frame_capacity, 256);
            assert!(model.read_window < model.command_timeout);
        }
    }
}
