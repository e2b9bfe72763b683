use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PortStatus {
    pub name: String,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
struct PortsOutput<'a> {
    schema_id: &'static str,
    line_settings: String,
    ports: &'a [PortStatus],
}

pub fn print_ports(ports: &[PortStatus], line_settings: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PortsOutput {
                schema_id: "dmxline.cli.v1.ports",
                line_settings: line_settings.to_string(),
                ports,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "DMX512", "DETAIL"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    if port.compatible { "yes" } else { "no" }.to_string(),
                    port.reason.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports accept {line_settings}");
            }
            for port in ports {
                match &port.reason {
                    Some(reason) => println!("{} (incompatible: {reason})", port.name),
                    None => println!("{} ({line_settings})", port.name),
                }
            }
        }
        OutputFormat::Raw => {
            for port in ports.iter().filter(|p| p.compatible) {
                println!("{}", port.name);
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransmitSummary {
    pub schema_id: &'static str,
    pub port: String,
    pub dry_run: bool,
    pub blackout: bool,
    pub frames_sent: u64,
    pub write_errors: u64,
    pub elapsed_ms: u64,
    pub refresh_hz: f64,
}

impl TransmitSummary {
    pub fn refresh_rate(frames: u64, elapsed: std::time::Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (frames as f64 / secs * 10.0).round() / 10.0
    }
}

pub fn print_summary(summary: &TransmitSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "FRAMES", "ERRORS", "ELAPSED", "REFRESH"])
                .add_row(vec![
                    summary.port.clone(),
                    summary.frames_sent.to_string(),
                    summary.write_errors.to_string(),
                    format!("{} ms", summary.elapsed_ms),
                    format!("{:.1} Hz", summary.refresh_hz),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "port={}{} frames={} errors={} elapsed={}ms refresh={:.1}Hz",
                summary.port,
                if summary.dry_run { " (dry run)" } else { "" },
                summary.frames_sent,
                summary.write_errors,
                summary.elapsed_ms,
                summary.refresh_hz
            );
        }
        OutputFormat::Raw => {
            println!("{}", summary.frames_sent);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn refresh_rate_rounds_to_one_decimal() {
        assert_eq!(
            TransmitSummary::refresh_rate(441, Duration::from_secs(10)),
            44.1
        );
        assert_eq!(TransmitSummary::refresh_rate(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn compatible_port_omits_reason_in_json() {
        let port = PortStatus {
            name: "/dev/ttyUSB0".to_string(),
            compatible: true,
            reason: None,
        };
        let json = serde_json::to_string(&port).expect("port status should serialize");
        assert!(!json.contains("reason"));
        assert!(json.contains("\"compatible\":true"));
    }
}
