//! Espressif AT firmware commands (ESP32-WROOM, ESP8266).
//!
//! These modules echo every command verbatim while `ATE1` is in effect,
//! which is the factory default.

use std::fmt;

use serde::Serialize;

use atlink_core::error::{Error, Result};
use atlink_core::{AtResponse, Command};

use super::expect_ok;
use crate::device::AtDevice;

/// Longest remote host accepted by `AT+SAVETRANSLINK`.
pub const MAX_REMOTE_HOST_LEN: usize = 64;

/// Longest TCP keep-alive interval, in seconds.
pub const MAX_KEEP_ALIVE_SECS: u16 = 7200;

// ---------------------------------------------------------------
// Basic commands
// ---------------------------------------------------------------

/// `AT` -- liveness check.
pub fn cmd_test() -> Command {
    Command::new("AT")
}

/// `AT+RST` -- restart the module.
pub fn cmd_restart() -> Command {
    Command::new("AT+RST")
}

/// `AT+GMR` -- firmware version information.
pub fn cmd_version() -> Command {
    Command::new("AT+GMR")
}

/// `AT+GSLP=<ms>` -- enter deep sleep for `ms` milliseconds.
pub fn cmd_deep_sleep(ms: u32) -> Command {
    Command::new(format!("AT+GSLP={ms}"))
}

/// `ATE1` / `ATE0` -- turn command echo on or off.
///
/// With echo off the module no longer matches the exact-prefix strategy;
/// rebuild the device with a different echo strategy afterwards.
pub fn cmd_echo(on: bool) -> Command {
    Command::new(if on { "ATE1" } else { "ATE0" })
}

/// Firmware details reported by `AT+GMR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub at_version: String,
    pub sdk_version: String,
    pub compile_time: String,
    pub bin_version: String,
}

/// Interpret an `AT+GMR` reply: four information lines, then `OK`.
pub fn parse_version(resp: &AtResponse) -> Result<VersionInfo> {
    expect_ok(resp)?;
    match resp.data_lines() {
        [at, sdk, compile, bin] => Ok(VersionInfo {
            at_version: at.clone(),
            sdk_version: sdk.clone(),
            compile_time: compile.clone(),
            bin_version: bin.clone(),
        }),
        other => Err(Error::Protocol(format!(
            "AT+GMR: expected 4 version lines, got {}: {other:?}",
            other.len()
        ))),
    }
}

// ---------------------------------------------------------------
// Transparent transmission link (AT+SAVETRANSLINK)
// ---------------------------------------------------------------

/// Connection type for a TCP or SSL passthrough link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLinkType {
    Tcp,
    TcpV6,
    Ssl,
    SslV6,
}

impl StreamLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamLinkType::Tcp => "TCP",
            StreamLinkType::TcpV6 => "TCPv6",
            StreamLinkType::Ssl => "SSL",
            StreamLinkType::SslV6 => "SSLv6",
        }
    }
}

/// Connection type for a UDP passthrough link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramLinkType {
    Udp,
    UdpV6,
}

impl DatagramLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            DatagramLinkType::Udp => "UDP",
            DatagramLinkType::UdpV6 => "UDPv6",
        }
    }
}

/// The passthrough link a module enters at power-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransLink {
    /// Do not enter passthrough mode at power-on.
    Disabled,
    Stream {
        remote_host: String,
        remote_port: u16,
        link_type: StreamLinkType,
        /// TCP keep-alive in seconds, 0 disables it.
        keep_alive: u16,
    },
    Datagram {
        remote_host: String,
        remote_port: u16,
        link_type: DatagramLinkType,
        /// 0 lets the module pick a local port.
        local_port: u16,
    },
    Ble {
        role: u8,
        tx_service: u8,
        tx_char: u8,
        rx_service: u8,
        rx_char: u8,
        /// Peer address, `aa:bb:cc:dd:ee:ff`.
        peer_addr: String,
    },
}

impl fmt::Display for TransLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransLink::Disabled => write!(f, "0"),
            TransLink::Stream {
                remote_host,
                remote_port,
                link_type,
                keep_alive,
            } => write!(
                f,
                "1,\"{remote_host}\",{remote_port},\"{}\",{keep_alive}",
                link_type.as_str()
            ),
            TransLink::Datagram {
                remote_host,
                remote_port,
                link_type,
                local_port,
            } => write!(
                f,
                "1,\"{remote_host}\",{remote_port},\"{}\",{local_port}",
                link_type.as_str()
            ),
            TransLink::Ble {
                role,
                tx_service,
                tx_char,
                rx_service,
                rx_char,
                peer_addr,
            } => write!(
                f,
                "2,{role},{tx_service},{tx_char},{rx_service},{rx_char},\"{peer_addr}\""
            ),
        }
    }
}

fn validate_remote(host: &str, port: u16) -> Result<()> {
    if host.is_empty() || host.len() > MAX_REMOTE_HOST_LEN {
        return Err(Error::InvalidParameter(format!(
            "remote host must be 1-{MAX_REMOTE_HOST_LEN} bytes, got {}",
            host.len()
        )));
    }
    if host.contains(['"', ',']) || host.chars().any(char::is_whitespace) {
        return Err(Error::InvalidParameter(format!(
            "remote host contains characters the module cannot parse: {host:?}"
        )));
    }
    if port == 0 {
        return Err(Error::InvalidParameter(
            "remote port must be between 1 and 65535".into(),
        ));
    }
    Ok(())
}

fn is_ble_addr(addr: &str) -> bool {
    let octets: Vec<&str> = addr.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `AT+SAVETRANSLINK=<args>` -- persist the power-on passthrough link.
pub fn cmd_save_trans_link(link: &TransLink) -> Result<Command> {
    match link {
        TransLink::Disabled => {}
        TransLink::Stream {
            remote_host,
            remote_port,
            keep_alive,
            ..
        } => {
            validate_remote(remote_host, *remote_port)?;
            if *keep_alive > MAX_KEEP_ALIVE_SECS {
                return Err(Error::InvalidParameter(format!(
                    "keep_alive must be between 0 and {MAX_KEEP_ALIVE_SECS}, got {keep_alive}"
                )));
            }
        }
        TransLink::Datagram {
            remote_host,
            remote_port,
            ..
        } => validate_remote(remote_host, *remote_port)?,
        TransLink::Ble { peer_addr, .. } => {
            if !is_ble_addr(peer_addr) {
                return Err(Error::InvalidParameter(format!(
                    "peer address must look like aa:bb:cc:dd:ee:ff, got {peer_addr:?}"
                )));
            }
        }
    }
    Ok(Command::new(format!("AT+SAVETRANSLINK={link}")))
}

// ---------------------------------------------------------------
// Device helpers
// ---------------------------------------------------------------

/// Send `AT` and require `OK`.
pub async fn ping(device: &AtDevice) -> Result<()> {
    expect_ok(&device.transact(&cmd_test(), device.command_timeout()).await?)
}

/// Send `AT+RST`. The module reboots after acknowledging; flush the boot
/// banner before the next command.
pub async fn restart(device: &AtDevice) -> Result<()> {
    expect_ok(&device.transact(&cmd_restart(), device.command_timeout()).await?)
}

/// Query `AT+GMR`.
pub async fn version(device: &AtDevice) -> Result<VersionInfo> {
    let resp = device.transact(&cmd_version(), device.command_timeout()).await?;
    parse_version(&resp)
}

pub async fn deep_sleep(device: &AtDevice, ms: u32) -> Result<()> {
    expect_ok(&device.transact(&cmd_deep_sleep(ms), device.command_timeout()).await?)
}

pub async fn set_echo(device: &AtDevice, on: bool) -> Result<()> {
    expect_ok(&device.transact(&cmd_echo(on), device.command_timeout()).await?)
}

pub async fn save_trans_link(device: &AtDevice, link: &TransLink) -> Result<()> {
    let cmd = cmd_save_trans_link(link)?;
    expect_ok(&device.transact(&cmd, device.command_timeout()).await?)
}
