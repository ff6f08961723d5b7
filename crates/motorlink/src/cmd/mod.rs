use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use motorlink_transport::{AddressSpec, DatagramTransport, TransportConfig};

use crate::exit::{address_error, transport_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod get;
pub mod info;
pub mod read;
pub mod send;
pub mod simulate;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a device and print its identity.
    Info(InfoArgs),
    /// Query a single identity key.
    Get(GetArgs),
    /// Read status records.
    Read(ReadArgs),
    /// Send one command payload.
    Send(SendArgs),
    /// Poll status records until interrupted.
    Watch(WatchArgs),
    /// Run a simulated device on a local UDP port.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub transport: TransportConfig,
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Info(args) => info::run(args, ctx),
        Command::Get(args) => get::run(args, ctx),
        Command::Read(args) => read::run(args, ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Watch(args) => watch::run(args, ctx),
        Command::Simulate(args) => simulate::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Device address (host[:port]).
    #[arg(env = "MOTORLINK_ADDR")]
    pub address: String,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Device address (host[:port]).
    #[arg(env = "MOTORLINK_ADDR")]
    pub address: String,
    /// Identity key (e.g. name, version, serial).
    pub key: String,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Device address (host[:port]).
    #[arg(env = "MOTORLINK_ADDR")]
    pub address: String,
    /// Expected status record size in bytes.
    #[arg(long, value_parser = clap::value_parser!(u8))]
    pub size: u8,
    /// Number of records to read.
    #[arg(long, default_value = "1")]
    pub count: u64,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device address (host[:port]).
    #[arg(env = "MOTORLINK_ADDR")]
    pub address: String,
    /// Command payload as hex (e.g. "01a0ff" or "01 a0 ff").
    #[arg(long)]
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Device address (host[:port]).
    #[arg(env = "MOTORLINK_ADDR")]
    pub address: String,
    /// Expected status record size in bytes.
    #[arg(long, value_parser = clap::value_parser!(u8))]
    pub size: u8,
    /// Delay between reads (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Stop after N records.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Local address to bind.
    #[arg(long, default_value = "127.0.0.1:7770")]
    pub bind: String,
    /// JSON device profile ({"identity": {...}, "status": [...]}).
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_address(input: &str) -> CliResult<AddressSpec> {
    input.parse().map_err(address_error)
}

pub fn open_transport(address: &str, ctx: &Context) -> CliResult<DatagramTransport> {
    let address = parse_address(address)?;
    DatagramTransport::open(&address, ctx.transport.clone())
        .map_err(|err| transport_error("open failed", err))
}

/// Parse `150ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse hex text, ignoring whitespace, commas and `0x` prefixes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|chunk| chunk.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("hex payload has an odd number of digits: {input}"),
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex payload: {input}")))
        })
        .collect()
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
