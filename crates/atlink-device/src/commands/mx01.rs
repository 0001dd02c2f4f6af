//! MX01 BLE module commands.
//!
//! Queries are answered with the field name instead of an echo
//! (`AT+NAME?` -> `+NAME:MX01`, `OK`). Set commands get a bare `OK`.
//! Most settings take effect after `AT+REBOOT=1`.

use std::fmt;

use atlink_core::error::{Error, Result};
use atlink_core::{AtResponse, Command};

use super::{expect_ok, is_hex};
use crate::device::AtDevice;

/// Longest advertised name, in bytes.
pub const MAX_NAME_LEN: usize = 20;

/// Baud rates selectable with `AT+UART=<index>`, in index order.
pub const UART_BAUD_RATES: [u32; 6] = [9_600, 14_400, 19_200, 38_400, 57_600, 115_200];

/// Highest TX power index accepted by `AT+TXPOWER`.
pub const MAX_TX_POWER_INDEX: u8 = 8;

/// Queryable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Mac,
    Name,
    Advertising,
    Uart,
    /// The currently connected peer.
    Device,
    AdvInterval,
    Version,
    TxPower,
    UuidService,
    UuidNotify,
    UuidWrite,
    AdvData,
}

impl Field {
    /// Every queryable field.
    pub const ALL: [Field; 12] = [
        Field::Mac,
        Field::Name,
        Field::Advertising,
        Field::Uart,
        Field::Device,
        Field::AdvInterval,
        Field::Version,
        Field::TxPower,
        Field::UuidService,
        Field::UuidNotify,
        Field::UuidWrite,
        Field::AdvData,
    ];

    /// The name the firmware uses on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Mac => "MAC",
            Field::Name => "NAME",
            Field::Advertising => "ADV",
            Field::Uart => "UART",
            Field::Device => "DEV",
            Field::AdvInterval => "AINTVL",
            Field::Version => "VER",
            Field::TxPower => "TXPOWER",
            Field::UuidService => "UUIDS",
            Field::UuidNotify => "UUIDN",
            Field::UuidWrite => "UUIDW",
            Field::AdvData => "AMDATA",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which UUID [`cmd_set_uuid`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidChannel {
    Service,
    Notify,
    Write,
}

impl UuidChannel {
    fn field(self) -> Field {
        match self {
            UuidChannel::Service => Field::UuidService,
            UuidChannel::Notify => Field::UuidNotify,
            UuidChannel::Write => Field::UuidWrite,
        }
    }
}

/// Target of `AT+DISCONN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Drop every connected peripheral.
    Peripherals = 0,
    /// Drop the link to the central.
    Central = 1,
}

// ---------------------------------------------------------------
// Queries
// ---------------------------------------------------------------

/// `AT+<FIELD>?`
pub fn cmd_query(field: Field) -> Command {
    Command::new(format!("AT+{field}?"))
}

/// Extract the value of `+<FIELD>:<value>` from a query reply.
pub fn parse_field(resp: &AtResponse, field: Field) -> Result<String> {
    expect_ok(resp)?;
    let prefix = format!("+{field}:");
    resp.data_lines()
        .iter()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| {
            Error::Protocol(format!(
                "{} reply has no {prefix} line: {:?}",
                resp.command, resp.lines
            ))
        })
}

/// Map a `AT+UART` index to its baud rate.
pub fn uart_baud(index: u8) -> Option<u32> {
    UART_BAUD_RATES.get(index as usize).copied()
}

/// Map a baud rate to its `AT+UART` index.
pub fn uart_index(baud: u32) -> Option<u8> {
    UART_BAUD_RATES
        .iter()
        .position(|&b| b == baud)
        .map(|i| i as u8)
}

// ---------------------------------------------------------------
// Setters
// ---------------------------------------------------------------

/// `AT+MAC=<12 hex digits>`
pub fn cmd_set_mac(mac: &str) -> Result<Command> {
    if mac.len() != 12 || !is_hex(mac) {
        return Err(Error::InvalidParameter(format!(
            "MAC must be 12 hex digits, got {mac:?}"
        )));
    }
    Ok(Command::new(format!("AT+MAC={mac}")))
}

/// `AT+NAME=<name>`
pub fn cmd_set_name(name: &str) -> Result<Command> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidParameter(format!(
            "name must be 1-{MAX_NAME_LEN} bytes, got {}",
            name.len()
        )));
    }
    if name.contains(['\r', '\n']) {
        return Err(Error::InvalidParameter("name must not contain line breaks".into()));
    }
    Ok(Command::new(format!("AT+NAME={name}")))
}

/// `AT+ADV=<0|1>`
pub fn cmd_set_advertising(on: bool) -> Command {
    Command::new(format!("AT+ADV={}", u8::from(on)))
}

/// `AT+UART=<index>`, see [`UART_BAUD_RATES`].
pub fn cmd_set_uart(index: u8) -> Result<Command> {
    if uart_baud(index).is_none() {
        return Err(Error::InvalidParameter(format!(
            "UART index must be 0-{}, got {index}",
            UART_BAUD_RATES.len() - 1
        )));
    }
    Ok(Command::new(format!("AT+UART={index}")))
}

/// `AT+AINTVL=<ms>`, 20 to 10000 ms.
pub fn cmd_set_adv_interval(ms: u16) -> Result<Command> {
    if !(20..=10_000).contains(&ms) {
        return Err(Error::InvalidParameter(format!(
            "advertising interval must be 20-10000 ms, got {ms}"
        )));
    }
    Ok(Command::new(format!("AT+AINTVL={ms}")))
}

/// `AT+TXPOWER=<index>`
pub fn cmd_set_tx_power(index: u8) -> Result<Command> {
    if index > MAX_TX_POWER_INDEX {
        return Err(Error::InvalidParameter(format!(
            "TX power index must be 0-{MAX_TX_POWER_INDEX}, got {index}"
        )));
    }
    Ok(Command::new(format!("AT+TXPOWER={index}")))
}

/// `AT+UUIDS=` / `AT+UUIDN=` / `AT+UUIDW=` with a 16-bit (4 hex digits) or
/// 128-bit (32 hex digits) UUID.
pub fn cmd_set_uuid(channel: UuidChannel, uuid: &str) -> Result<Command> {
    if !matches!(uuid.len(), 4 | 32) || !is_hex(uuid) {
        return Err(Error::InvalidParameter(format!(
            "UUID must be 4 or 32 hex digits, got {uuid:?}"
        )));
    }
    Ok(Command::new(format!("AT+{}={uuid}", channel.field())))
}

/// `AT+AMDATA=<hex>` -- custom advertising payload.
pub fn cmd_set_adv_data(hex: &str) -> Result<Command> {
    if hex.len() % 2 != 0 || !is_hex(hex) {
        return Err(Error::InvalidParameter(format!(
            "advertising data must be an even number of hex digits, got {hex:?}"
        )));
    }
    Ok(Command::new(format!("AT+AMDATA={hex}")))
}

/// `AT+DISCONN=<n>`
pub fn cmd_disconnect(target: Disconnect) -> Command {
    Command::new(format!("AT+DISCONN={}", target as u8))
}

/// `AT+RESET=1` -- restore factory settings.
pub fn cmd_factory_reset() -> Command {
    Command::new("AT+RESET=1")
}

/// `AT+REBOOT=1`
pub fn cmd_reboot() -> Command {
    Command::new("AT+REBOOT=1")
}

// ---------------------------------------------------------------
// Device helpers
// ---------------------------------------------------------------

/// Query one field and return its value.
pub async fn query(device: &AtDevice, field: Field) -> Result<String> {
    let resp = device
        .transact(&cmd_query(field), device.command_timeout())
        .await?;
    parse_field(&resp, field)
}

/// Run a setter and require `OK`.
pub async fn apply(device: &AtDevice, cmd: &Command) -> Result<()> {
    expect_ok(&device.transact(cmd, device.command_timeout()).await?)
}

pub async fn name(device: &AtDevice) -> Result<String> {
    query(device, Field::Name).await
}

pub async fn set_name(device: &AtDevice, name: &str) -> Result<()> {
    apply(device, &cmd_set_name(name)?).await
}

/// Current UART baud rate, decoded from the index the module reports.
pub async fn uart(device: &AtDevice) -> Result<u32> {
    let value = query(device, Field::Uart).await?;
    value
        .parse::<u8>()
        .ok()
        .and_then(uart_baud)
        .ok_or_else(|| Error::Protocol(format!("unknown UART index {value:?}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::builder::AtDeviceBuilder;
    use crate::models::mx01;
    use atlink_test_harness::{MockTransport, Reply};

    async fn device(mock: MockTransport) -> AtDevice {
        AtDeviceBuilder::new(mx01())
            .build_with_transport(Box::new(mock))
            .await
            .unwrap()
    }

    #[test]
    fn query_wire_forms() {
        let expected = [
            "AT+MAC?", "AT+NAME?", "AT+ADV?", "AT+UART?", "AT+DEV?", "AT+AINTVL?", "AT+VER?",
            "AT+TXPOWER?", "AT+UUIDS?", "AT+UUIDN?", "AT+UUIDW?", "AT+AMDATA?",
        ];
        for (field, text) in Field::ALL.iter().zip(expected) {
            let cmd = cmd_query(*field);
            assert_eq!(cmd.text(), text);
            assert!(cmd.is_query());
        }
    }

    #[test]
    fn parse_field_extracts_value() {
        let resp = AtResponse::new(
            cmd_query(Field::Name),
            vec!["+NAME:MX01".into(), "OK".into()],
        );
        assert_eq!(parse_field(&resp, Field::Name).unwrap(), "MX01");
        assert!(matches!(parse_field(&resp, Field::Mac), Err(Error::Protocol(_))));

        let failed = AtResponse::new(cmd_query(Field::Name), vec!["+NAME:MX01".into(), "ERROR".into()]);
        assert!(matches!(parse_field(&failed, Field::Name), Err(Error::Protocol(_))));
    }

    #[test]
    fn uart_table() {
        assert_eq!(uart_baud(0), Some(9_600));
        assert_eq!(uart_baud(2), Some(19_200));
        assert_eq!(uart_baud(5), Some(115_200));
        assert_eq!(uart_baud(6), None);
        assert_eq!(uart_index(57_600), Some(4));
        assert_eq!(uart_index(4_800), None);
    }

    #[test]
    fn setter_validation() {
        assert_eq!(cmd_set_mac("A1B2C3D4E5F6").unwrap().text(), "AT+MAC=A1B2C3D4E5F6");
        assert!(cmd_set_mac("A1B2C3D4E5").is_err());
        assert!(cmd_set_mac("A1B2C3D4E5GG").is_err());

        assert_eq!(cmd_set_name("beacon-01").unwrap().text(), "AT+NAME=beacon-01");
        assert!(cmd_set_name(&"n".repeat(20)).is_ok());
        assert!(cmd_set_name(&"n".repeat(21)).is_err());
        assert!(cmd_set_name("").is_err());

        assert_eq!(cmd_set_advertising(true).text(), "AT+ADV=1");
        assert_eq!(cmd_set_advertising(false).text(), "AT+ADV=0");

        assert_eq!(cmd_set_uart(2).unwrap().as_bytes(), b"AT+UART=2\r\n");
        assert!(cmd_set_uart(6).is_err());

        assert!(cmd_set_adv_interval(20).is_ok());
        assert!(cmd_set_adv_interval(10_000).is_ok());
        assert!(cmd_set_adv_interval(19).is_err());
        assert!(cmd_set_adv_interval(10_001).is_err());

        assert_eq!(cmd_set_tx_power(8).unwrap().text(), "AT+TXPOWER=8");
        assert!(cmd_set_tx_power(9).is_err());

        assert_eq!(
            cmd_set_uuid(UuidChannel::Service, "FFE0").unwrap().text(),
            "AT+UUIDS=FFE0"
        );
        assert_eq!(
            cmd_set_uuid(UuidChannel::Write, "0000ffe100001000800000805f9b34fb")
                .unwrap()
                .text(),
            "AT+UUIDW=0000ffe100001000800000805f9b34fb"
        );
        assert!(cmd_set_uuid(UuidChannel::Notify, "FFE").is_err());
        assert!(cmd_set_uuid(UuidChannel::Notify, "WXYZ").is_err());

        assert_eq!(cmd_set_adv_data("0201FF").unwrap().text(), "AT+AMDATA=0201FF");
        assert!(cmd_set_adv_data("0201F").is_err());
        assert!(cmd_set_adv_data("").is_err());
    }

    #[test]
    fn fixed_commands() {
        assert_eq!(cmd_disconnect(Disconnect::Peripherals).text(), "AT+DISCONN=0");
        assert_eq!(cmd_disconnect(Disconnect::Central).text(), "AT+DISCONN=1");
        assert_eq!(cmd_factory_reset().text(), "AT+RESET=1");
        assert_eq!(cmd_reboot().text(), "AT+REBOOT=1");
    }

    #[tokio::test(start_paused = true)]
    async fn name_query_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+NAME?\r\n", Reply::bytes(b"+NAME:MX01\r\nOK\r\n"));
        assert_eq!(name(&device(mock).await).await.unwrap(), "MX01");
    }

    #[tokio::test(start_paused = true)]
    async fn set_name_expects_bare_ok() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+NAME=beacon\r\n", Reply::bytes(b"OK\r\n"));
        set_name(&device(mock).await, "beacon").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn set_name_invalid_sends_nothing() {
        let err = set_name(&device(MockTransport::new()).await, &"x".repeat(21))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn uart_query_decodes_index() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"AT+UART?\r\n",
            Reply::new()
                .chunk(b"+UART")
                .chunk_after(Duration::from_millis(70), b":5\r\nOK\r\n"),
        );
        assert_eq!(uart(&device(mock).await).await.unwrap(), 115_200);
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_reply_is_echo_mismatch() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+VER?\r\n", Reply::bytes(b"+DEV:aa:bb\r\nOK\r\n"));
        let err = query(&device(mock).await, Field::Version).await.unwrap_err();
        assert!(matches!(err, Error::EchoMismatch { .. }));
    }
}
