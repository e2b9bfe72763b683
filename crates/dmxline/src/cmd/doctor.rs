use std::time::{Duration, Instant};

use dmxline_sender::{configure, list_compatible_ports, DEFAULT_BREAK_DURATION};
use dmxline_transport::SystemPort;
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

// Sleep overshoot beyond this makes the refresh rate visibly uneven.
const BREAK_JITTER_WARN: Duration = Duration::from_millis(2);
const BREAK_SAMPLES: u32 = 20;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        serial_enumeration_check(),
        dmx_ports_check(),
        break_timing_check(),
        compiled_features_check(),
        configured_port_check(std::env::var("DMXLINE_PORT").ok()),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        schema_id: "dmxline.cli.v1.doctor-report",
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("dmxline doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<22} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn serial_enumeration_check() -> CheckResult {
    match SystemPort::enumerate() {
        Ok(ports) => CheckResult::new(
            "serial_enumeration",
            CheckStatus::Pass,
            format!("{} serial port(s) found", ports.len()),
        ),
        Err(err) => CheckResult::new("serial_enumeration", CheckStatus::Fail, err.to_string()),
    }
}

fn dmx_ports_check() -> CheckResult {
    let ports = list_compatible_ports();
    if ports.is_empty() {
        CheckResult::new(
            "dmx_ports",
            CheckStatus::Warn,
            "no port accepted DMX512 line settings",
        )
    } else {
        CheckResult::new("dmx_ports", CheckStatus::Pass, ports.join(", "))
    }
}

/// Measure how far `thread::sleep` overshoots the default break length.
fn break_timing_check() -> CheckResult {
    let mut worst = Duration::ZERO;
    for _ in 0..BREAK_SAMPLES {
        let started = Instant::now();
        std::thread::sleep(DEFAULT_BREAK_DURATION);
        worst = worst.max(started.elapsed().saturating_sub(DEFAULT_BREAK_DURATION));
    }
    break_timing_result(worst)
}

fn break_timing_result(overshoot: Duration) -> CheckResult {
    let detail = format!(
        "{}us break overshoots by up to {}us",
        DEFAULT_BREAK_DURATION.as_micros(),
        overshoot.as_micros()
    );
    let status = if overshoot > BREAK_JITTER_WARN {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    CheckResult::new("break_timing", status, detail)
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "sender") {
        features.push("sender");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

fn configured_port_check(port: Option<String>) -> CheckResult {
    let Some(port) = port.filter(|p| !p.trim().is_empty()) else {
        return CheckResult::new("configured_port", CheckStatus::Skip, "DMXLINE_PORT not set");
    };

    match configure(SystemPort::new(port.as_str())) {
        Ok(_) => CheckResult::new(
            "configured_port",
            CheckStatus::Pass,
            format!("{port} accepts DMX512 line settings"),
        ),
        Err(err) => CheckResult::new("configured_port", CheckStatus::Fail, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            schema_id: "dmxline.cli.v1.doctor-report",
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }

    #[test]
    fn unset_port_is_skipped() {
        assert!(matches!(
            configured_port_check(None).status,
            CheckStatus::Skip
        ));
        assert!(matches!(
            configured_port_check(Some("  ".to_string())).status,
            CheckStatus::Skip
        ));
    }

    #[test]
    fn missing_configured_port_fails() {
        let result = configured_port_check(Some("/dev/dmxline-doctor-missing".to_string()));
        assert!(matches!(result.status, CheckStatus::Fail));
        assert!(result.detail.contains("/dev/dmxline-doctor-missing"));
    }

    #[test]
    fn large_break_overshoot_warns() {
        assert!(matches!(
            break_timing_result(Duration::from_micros(100)).status,
            CheckStatus::Pass
        ));
        assert!(matches!(
            break_timing_result(Duration::from_millis(5)).status,
            CheckStatus::Warn
        ));
    }
}
