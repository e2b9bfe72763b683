use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dmxline_frame::CHANNEL_COUNT;
use dmxline_sender::{Communicator, SenderConfig};
use dmxline_transport::{MemoryTransport, SerialTransport, SystemPort};
use tracing::{info, warn};

use crate::cmd::TransmitArgs;
use crate::exit::{sender_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_summary, OutputFormat, TransmitSummary};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DRY_RUN_HISTORY: usize = 64;
const BLACKOUT_WAIT: Duration = Duration::from_millis(500);

pub fn run(args: TransmitArgs, format: OutputFormat) -> CliResult<i32> {
    let assignments = parse_assignments(&args.set)?;
    let duration = args.duration.as_deref().map(parse_duration).transpose()?;
    let config = SenderConfig {
        break_duration: Duration::from_micros(args.break_us),
        stop_timeout: parse_duration(&args.stop_timeout)?,
    };

    let transport: Box<dyn SerialTransport> = if args.dry_run {
        Box::new(MemoryTransport::with_history(args.port.as_str(), DRY_RUN_HISTORY))
    } else {
        Box::new(SystemPort::new(args.port.as_str()))
    };
    let dmx = Communicator::with_config(transport, config)
        .map_err(|err| sender_error("port validation failed", err))?;

    if let Some(value) = args.fill {
        dmx.set_bytes(&[value; CHANNEL_COUNT])
            .map_err(|err| sender_error("fill failed", err))?;
    }
    for (index, value) in assignments {
        dmx.set_byte(index, value)
            .map_err(|err| sender_error(&format!("--set {index}={value} failed"), err))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    dmx.start().map_err(|err| sender_error("start failed", err))?;
    let started = Instant::now();
    info!(port = %args.port, dry_run = args.dry_run, "transmitting; press Ctrl-C to stop");

    while running.load(Ordering::SeqCst) {
        if duration.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    let blackout = args.blackout && send_blackout(&dmx, BLACKOUT_WAIT);
    dmx.stop();
    let elapsed = started.elapsed();

    let summary = TransmitSummary {
        schema_id: "dmxline.cli.v1.transmit-summary",
        port: dmx.port_name().to_string(),
        dry_run: args.dry_run,
        blackout,
        frames_sent: dmx.frames_sent(),
        write_errors: dmx.write_errors(),
        elapsed_ms: elapsed.as_millis() as u64,
        refresh_hz: TransmitSummary::refresh_rate(dmx.frames_sent(), elapsed),
    };
    print_summary(&summary, format);

    Ok(SUCCESS)
}

/// Zero every channel and wait until a frame built after the clear is on the
/// wire. Returns false if no such frame went out within `wait`.
fn send_blackout<T: SerialTransport + 'static>(dmx: &Communicator<T>, wait: Duration) -> bool {
    dmx.buffer().clear();
    // The frame in flight may predate the clear; the one after it cannot.
    let target = dmx.frames_sent() + 2;
    let deadline = Instant::now() + wait;
    while dmx.frames_sent() < target {
        if Instant::now() >= deadline {
            warn!(port = %dmx.port_name(), "blackout frame not confirmed before stop");
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    info!(port = %dmx.port_name(), "blackout sent");
    true
}

/// Parse `INDEX=VALUE` pairs. Range checks on the index are left to the sender.
fn parse_assignments(pairs: &[String]) -> CliResult<Vec<(usize, u8)>> {
    pairs
        .iter()
        .map(|pair| {
            let (index, value) = pair.split_once('=').ok_or_else(|| {
                CliError::usage(format!("--set expects INDEX=VALUE, got {pair:?}"))
            })?;
            let index: usize = index
                .trim()
                .parse()
                .map_err(|_| CliError::usage(format!("invalid channel index in {pair:?}")))?;
            let value: u8 = value.trim().parse().map_err(|_| {
                CliError::usage(format!("channel value in {pair:?} must be 0-255"))
            })?;
            Ok((index, value))
        })
        .collect()
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Err(CliError::usage(format!("unsupported duration unit: {unit}"))),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use dmxline_frame::{FRAME_SIZE, START_CODE};

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn blackout_puts_a_dark_frame_on_the_wire() {
        let transport = MemoryTransport::new("dark");
        let probe = transport.probe();
        let dmx = Communicator::new(transport).expect("memory transport should validate");
        dmx.set_bytes(&[200; CHANNEL_COUNT])
            .expect("full universe should be accepted");
        dmx.start().expect("start should succeed");

        let deadline = Instant::now() + Duration::from_secs(1);
        while dmx.frames_sent() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }

        assert!(send_blackout(&dmx, Duration::from_secs(1)));
        let last = probe.last_write().expect("a frame should have been written");
        dmx.stop();

        assert_eq!(last.len(), FRAME_SIZE);
        assert_eq!(last[0], START_CODE);
        assert!(last[1..].iter().all(|&v| v == 0));
        assert_eq!(dmx.get_bytes(), [0u8; CHANNEL_COUNT]);
    }

    #[test]
    fn blackout_reports_unconfirmed_when_idle() {
        let dmx = Communicator::new(MemoryTransport::new("idle"))
            .expect("memory transport should validate");
        dmx.set_byte(0, 9).expect("index should be valid");

        assert!(!send_blackout(&dmx, Duration::from_millis(20)));
        assert_eq!(dmx.get_byte(0).expect("index should be valid"), 0);
    }

    #[test]
    fn parse_assignments_accepts_pairs() {
        let pairs = vec!["0=255".to_string(), " 12 = 7 ".to_string()];
        assert_eq!(
            parse_assignments(&pairs).expect("pairs should parse"),
            vec![(0, 255), (12, 7)]
        );
    }

    #[test]
    fn parse_assignments_rejects_malformed_pairs() {
        for bad in ["5", "x=1", "1=256", "1=-1", "=3"] {
            let err = parse_assignments(&[bad.to_string()]).expect_err("pair should be rejected");
            assert_eq!(err.code, USAGE, "{bad} should be a usage error");
        }
    }

    #[test]
    fn parse_assignments_leaves_range_check_to_sender() {
        assert_eq!(
            parse_assignments(&["600=1".to_string()]).expect("pair should parse"),
            vec![(600, 1)]
        );
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
