use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod monitor;
pub mod parse;
pub mod send;
pub mod version;

/// Controller host used when neither `--url` nor `KNITLINK_HOST` is given.
pub const DEFAULT_HOST: &str = "ayab.local";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode captured SLIP bytes into knitting-machine messages.
    Decode(DecodeArgs),
    /// SLIP-frame a request-info message or an arbitrary payload.
    Encode(EncodeArgs),
    /// Parse and classify one control-channel JSON message.
    Parse(ParseArgs),
    /// Connect to a controller and print everything it sends.
    Monitor(MonitorArgs),
    /// Send one request to a controller and print the reply.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

impl Command {
    /// Whether the command asked for per-unit traffic logging.
    pub fn log_traffic(&self) -> bool {
        match self {
            Command::Monitor(args) => args.endpoint.log_traffic,
            Command::Send(args) => args.endpoint.log_traffic,
            _ => false,
        }
    }
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File with captured bytes. Reads stdin when omitted or `-`.
    #[arg(conflicts_with = "hex")]
    pub input: Option<PathBuf>,
    /// Bytes given as hex on the command line.
    #[arg(long)]
    pub hex: Option<String>,
    /// Feed the decoder in chunks of this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,
    /// Maximum decoded frame size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
    /// Exit with a data error when any frame is malformed.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Payload bytes as hex. Defaults to a request-info message.
    #[arg(long)]
    pub hex: Option<String>,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// JSON text. Reads stdin when omitted.
    pub text: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Controller host name or address.
    #[arg(long, env = "KNITLINK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Full WebSocket URL; overrides --host.
    #[arg(long)]
    pub url: Option<String>,
    /// Log every unit sent and received (debug level, session target).
    #[arg(long)]
    pub log_traffic: bool,
}

impl EndpointArgs {
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("ws://{}/ws", self.host),
        }
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Stop after this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    /// Do not request system info on connect.
    #[arg(long)]
    pub no_system_info: bool,
    /// Also ask the knitting-machine firmware for its version.
    #[arg(long)]
    pub machine_info: bool,
}

/// Requests `send` knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Request {
    SystemInfo,
    Esp32Reset,
    Ra4m1Reset,
    GetNetworkParams,
    SetNetworkParams,
    ListFiles,
    DeleteFiles,
    /// Knitting-machine request-info over the binary path.
    MachineInfo,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Request to send.
    #[arg(value_enum)]
    pub request: Request,
    /// Wi-Fi SSID for set-network-params.
    #[arg(long)]
    pub ssid: Option<String>,
    /// Wi-Fi password for set-network-params.
    #[arg(long)]
    pub password: Option<String>,
    /// Hostname for set-network-params.
    #[arg(long)]
    pub hostname: Option<String>,
    /// File path for delete-files (repeatable).
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<String>,
    /// Return right after sending.
    #[arg(long)]
    pub no_wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn endpoint_url_prefers_explicit_url() {
        let endpoint = EndpointArgs {
            host: "knitter.local".into(),
            url: None,
            log_traffic: false,
        };
        assert_eq!(endpoint.url(), "ws://knitter.local/ws");

        let endpoint = EndpointArgs {
            url: Some("ws://127.0.0.1:9000/ws".into()),
            ..endpoint
        };
        assert_eq!(endpoint.url(), "ws://127.0.0.1:9000/ws");
    }
}
