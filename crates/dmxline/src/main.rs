mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dmxline", version, about = "DMX512 output over serial adapters")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "DMXLINE_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transmit_subcommand() {
        let cli = Cli::try_parse_from([
            "dmxline",
            "transmit",
            "/dev/ttyUSB0",
            "--set",
            "0=255,1=128",
            "--set",
            "7=1",
            "--duration",
            "2s",
        ])
        .expect("transmit args should parse");

        let Command::Transmit(args) = cli.command else {
            panic!("expected transmit subcommand");
        };
        assert_eq!(args.port, "/dev/ttyUSB0");
        assert_eq!(args.set, vec!["0=255", "1=128", "7=1"]);
        assert_eq!(args.break_us, 1000);
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_ports_all() {
        let cli = Cli::try_parse_from(["dmxline", "ports", "--all", "--format", "json"])
            .expect("ports args should parse");
        assert!(matches!(cli.command, Command::Ports(ref args) if args.all));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn rejects_out_of_range_fill() {
        let err = Cli::try_parse_from(["dmxline", "transmit", "/dev/ttyUSB0", "--fill", "300"])
            .expect_err("fill above 255 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
