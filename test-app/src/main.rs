// atlink test application -- CLI tool for exercising AT-command modules
// against real hardware or a scripted mock transport.
//
// Usage:
//   atlink-test-app --model esp32-wroom --port /dev/ttyUSB0 ping
//   atlink-test-app --model esp32-wroom --port /dev/ttyUSB0 version
//   atlink-test-app --model mx01 --port /dev/ttyUSB1 name set beacon-01
//   atlink-test-app --model mx01 --mock raw "AT+NAME?"
//   atlink-test-app list

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use atlink::commands::{espressif, expect_ok, mx01};
use atlink::engine::EchoStrategy;
use atlink::engine::echo::echo_field;
use atlink::models::{self, DeviceModel, Vendor};
use atlink::{AtDevice, AtDeviceBuilder};
use atlink_test_harness::{MockTransport, Reply};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// atlink test application -- exercises AT modules from the command line.
#[derive(Parser)]
#[command(name = "atlink-test-app", version, about)]
struct Cli {
    /// Module model: esp32-wroom, esp8266, mx01.
    /// Required for all commands except `list`.
    #[arg(long)]
    model: Option<String>,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Override the model's default baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Override the model's default command timeout, in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Use a scripted mock transport instead of a real serial port.
    /// Useful for verifying CLI parsing and builder wiring without hardware.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a raw command and print the response lines.
    Raw {
        /// Command text without the terminator, e.g. "AT+GMR".
        text: String,
    },
    /// Check that the module answers `AT` with `OK`.
    Ping,
    /// Print firmware version information as JSON.
    Version,
    /// Discard stray output waiting on the line.
    Flush,
    /// Read or set the advertised BLE name (MX01).
    Name {
        #[command(subcommand)]
        action: Option<NameAction>,
    },
    /// List supported models.
    List,
}

#[derive(Subcommand)]
enum NameAction {
    Get,
    Set { name: String },
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Mock scripting
// ---------------------------------------------------------------------------

/// The reply a well-behaved module of `model` gives to `text`.
fn scripted_reply(model: &DeviceModel, text: &str) -> Reply {
    let cmd = atlink::Command::new(text);
    let body: &[u8] = match text {
        "AT+GMR" => b"AT version:2.4.0.0(mock)\r\nSDK version:mock\r\ncompile time:mock\r\nBin version:2.4.0(mock)\r\n\r\nOK\r\n",
        _ => b"OK\r\n",
    };
    let mut frame = Vec::new();
    match model.echo {
        EchoStrategy::ExactPrefix => frame.extend_from_slice(cmd.as_bytes()),
        EchoStrategy::FieldEcho { separator } => {
            if let Some(field) = echo_field(&cmd) {
                frame.extend_from_slice(field.as_bytes());
                frame.push(separator);
                frame.extend_from_slice(b"mock\r\n");
            }
        }
    }
    frame.extend_from_slice(body);
    Reply::new()
        .chunk(&frame[..frame.len() / 2])
        .chunk_after(Duration::from_millis(20), &frame[frame.len() / 2..])
}

/// Build a mock that answers the commands `command` will send.
fn build_mock(model: &DeviceModel, command: &Command) -> MockTransport {
    let mut mock = MockTransport::new();
    let sent: Vec<String> = match command {
        Command::Raw { text } => vec![text.clone()],
        Command::Ping => vec!["AT".into()],
        Command::Version if model.vendor == Vendor::Espressif => vec!["AT+GMR".into()],
        Command::Version => vec!["AT+VER?".into()],
        Command::Flush => {
            mock.push_unsolicited(Reply::bytes(b"\r\nready\r\n"));
            Vec::new()
        }
        Command::Name {
            action: Some(NameAction::Set { name }),
        } => vec![format!("AT+NAME={name}")],
        Command::Name { .. } => vec!["AT+NAME?".into()],
        Command::List => Vec::new(),
    };
    for text in sent {
        let reply = scripted_reply(model, &text);
        mock.expect(atlink::Command::new(text).as_bytes(), reply);
    }
    mock
}

// ---------------------------------------------------------------------------
// Device construction
// ---------------------------------------------------------------------------

fn lookup_model(cli: &Cli) -> Result<DeviceModel> {
    let id = cli
        .model
        .as_deref()
        .context("--model is required for this command")?;
    models::find_model(id).with_context(|| {
        let known: Vec<&str> = models::all_models().iter().map(|m| m.model_id).collect();
        format!("unknown model '{id}'. Supported: {}", known.join(", "))
    })
}

async fn open_device(cli: &Cli, model: DeviceModel) -> Result<AtDevice> {
    let name = model.name;
    let mut builder = AtDeviceBuilder::new(model.clone());
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(ms) = cli.timeout_ms {
        builder = builder.command_timeout(Duration::from_millis(ms));
    }

    if cli.mock {
        let mock = build_mock(&model, &cli.command);
        let device = builder
            .build_with_transport(Box::new(mock))
            .await
            .context("failed to build device with mock transport")?;
        println!("Connected (mock transport) -- {name}");
        return Ok(device);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let baud = cli.baud.unwrap_or(model.default_baud_rate);
    let device = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to open serial port {port} at {baud} baud"))?;
    info!(port, baud, model = name, "device open");
    println!("Connected to {port} at {baud} baud -- {name}");
    Ok(device)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    let entries = models::all_models();
    let name_width = entries.iter().map(|m| m.name.len()).max().unwrap_or(12).max(12);

    println!(
        "{:<10}  {:<name_width$}  {:<12}  {:>7}  Echo",
        "Vendor", "Model", "ID", "Baud",
    );
    println!(
        "{:<10}  {:<name_width$}  {:<12}  {:>7}  -----",
        "-".repeat(10),
        "-".repeat(name_width),
        "-".repeat(12),
        "-------",
    );
    for m in &entries {
        let echo = match m.echo {
            EchoStrategy::ExactPrefix => "exact",
            EchoStrategy::FieldEcho { .. } => "field",
        };
        println!(
            "{:<10}  {:<name_width$}  {:<12}  {:>7}  {echo}",
            m.vendor.to_string(),
            m.name,
            m.model_id,
            m.default_baud_rate,
        );
    }
    println!();
    println!("{} models total.", entries.len());
    Ok(())
}

async fn cmd_raw(device: &AtDevice, text: &str) -> Result<()> {
    let resp = device
        .command(text)
        .await
        .with_context(|| format!("{text} failed"))?;
    for line in &resp.lines {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_ping(device: &AtDevice) -> Result<()> {
    let resp = device.command("AT").await.context("AT failed")?;
    expect_ok(&resp)?;
    println!("OK");
    Ok(())
}

async fn cmd_version(device: &AtDevice) -> Result<()> {
    let json = match device.model().vendor {
        Vendor::Espressif => serde_json::to_value(espressif::version(device).await?)?,
        Vendor::Mx => serde_json::json!({
            "version": mx01::query(device, mx01::Field::Version).await?,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn cmd_flush(device: &AtDevice) -> Result<()> {
    let discarded = device.flush().await?;
    println!("Discarded {discarded} bytes.");
    Ok(())
}

async fn cmd_name(device: &AtDevice, action: Option<&NameAction>) -> Result<()> {
    if device.model().vendor != Vendor::Mx {
        bail!("the name command is only supported on MX01 modules");
    }
    match action {
        None | Some(NameAction::Get) => println!("{}", mx01::name(device).await?),
        Some(NameAction::Set { name }) => {
            mx01::set_name(device, name).await?;
            println!("Name set to {name}. Takes effect after reboot.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // The `list` command does not require a device.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let model = lookup_model(&cli)?;
    let device = open_device(&cli, model).await?;
    debug!(model = device.model().name, "running command");

    let result = match &cli.command {
        Command::Raw { text } => cmd_raw(&device, text).await,
        Command::Ping => cmd_ping(&device).await,
        Command::Version => cmd_version(&device).await,
        Command::Flush => cmd_flush(&device).await,
        Command::Name { action } => cmd_name(&device, action.as_ref()).await,
        Command::List => Ok(()),
    };
    device.close().await.ok();
    result
}
