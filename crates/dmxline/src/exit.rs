use std::fmt;
use std::io;

use dmxline_frame::FrameError;
use dmxline_sender::SenderError;
use dmxline_transport::TransportError;

// Exit code constants shared by every subcommand.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_kind_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::Interrupted => FAILURE,
        _ => TRANSPORT_ERROR,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = err.io_kind().map_or(TRANSPORT_ERROR, io_kind_code);
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn sender_error(context: &str, err: SenderError) -> CliError {
    match err {
        SenderError::Config { source, .. } | SenderError::Start { source, .. } => {
            transport_error(context, source)
        }
        SenderError::Transport(err) => transport_error(context, err),
        SenderError::Frame(err) => frame_error(context, err),
        SenderError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_maps_to_transport_error() {
        let err = SenderError::Config {
            port: "/dev/ttyUSB9".to_string(),
            source: TransportError::Open {
                port: "/dev/ttyUSB9".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
            },
        };
        let cli = sender_error("open failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("/dev/ttyUSB9"));
    }

    #[test]
    fn permission_denied_is_reported_as_such() {
        let err = TransportError::Open {
            port: "/dev/ttyS0".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(transport_error("open failed", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn write_timeout_maps_to_timeout() {
        let err = TransportError::Io(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        let cli = transport_error("transmit failed", err);
        assert_eq!(cli.code, TIMEOUT);
        assert!(cli.message.starts_with("transmit failed: "));
    }

    #[test]
    fn errors_without_io_source_are_transport_errors() {
        let err = TransportError::NotOpen {
            port: "/dev/ttyUSB0".to_string(),
        };
        assert_eq!(transport_error("write failed", err).code, TRANSPORT_ERROR);
        let err = TransportError::Enumerate("no sysfs".to_string());
        assert_eq!(transport_error("ports", err).code, TRANSPORT_ERROR);
    }

    #[test]
    fn channel_errors_are_data_invalid() {
        let err = SenderError::Frame(FrameError::ChannelOutOfRange { index: 600, max: 511 });
        assert_eq!(sender_error("set failed", err).code, DATA_INVALID);
    }

    #[test]
    fn invalid_config_is_usage() {
        let err = SenderError::InvalidConfig("break too short".to_string());
        assert_eq!(sender_error("config", err).code, USAGE);
    }
}
