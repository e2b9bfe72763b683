use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod ports;
pub mod transmit;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports that accept DMX512 line settings.
    Ports(PortsArgs),
    /// Transmit a universe until interrupted or for a fixed duration.
    Transmit(TransmitArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Transmit(args) => transmit::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// Also list ports that failed validation, with the reason.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct TransmitArgs {
    /// Serial port to transmit on (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "DMXLINE_PORT")]
    pub port: String,
    /// Channel values as INDEX=VALUE pairs, 0-based (comma-separated).
    #[arg(long = "set", value_name = "INDEX=VALUE", value_delimiter = ',')]
    pub set: Vec<String>,
    /// Value written to every channel before --set pairs are applied.
    #[arg(long, value_name = "VALUE")]
    pub fill: Option<u8>,
    /// Stop after this long (e.g. 10s, 500ms). Default: until Ctrl-C.
    #[arg(long)]
    pub duration: Option<String>,
    /// Break hold time in microseconds (minimum 100).
    #[arg(long, default_value_t = 1000)]
    pub break_us: u64,
    /// Maximum time to wait for the transmission thread on shutdown.
    #[arg(long, default_value = "1s")]
    pub stop_timeout: String,
    /// Send an all-zero universe before stopping so fixtures go dark.
    #[arg(long)]
    pub blackout: bool,
    /// Transmit into an in-memory port instead of a device.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}
