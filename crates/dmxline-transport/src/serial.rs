use std::io::{ErrorKind, Write};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::settings::{DataBits, LineSettings, Parity, StopBits};
use crate::traits::SerialTransport;

/// An operating-system serial device driven through the `serialport` crate.
///
/// The handle is created lazily on [`open`](SerialTransport::open) and
/// released on [`close`](SerialTransport::close) or drop.
pub struct SystemPort {
    name: String,
    settings: LineSettings,
    write_timeout: Duration,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SystemPort {
    /// Default timeout applied to blocking writes.
    pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

    /// Create a closed handle for the named device, preset to DMX512 settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: LineSettings::DMX512,
            write_timeout: Self::DEFAULT_WRITE_TIMEOUT,
            port: None,
        }
    }

    /// Override the write timeout used when the device is opened.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Line settings that will be (or are) applied to the device.
    pub fn settings(&self) -> LineSettings {
        self.settings
    }

    /// Names of all serial devices visible to the system.
    pub fn enumerate() -> Result<Vec<String>> {
        let ports = serialport::available_ports()
            .map_err(|err| TransportError::Enumerate(err.to_string()))?;
        Ok(ports.into_iter().map(|info| info.port_name).collect())
    }

    fn configure_error(&self, err: serialport::Error) -> TransportError {
        TransportError::Configure {
            port: self.name.clone(),
            source: err.into(),
        }
    }

    fn handle(&self) -> Result<&dyn serialport::SerialPort> {
        self.port.as_deref().ok_or_else(|| TransportError::NotOpen {
            port: self.name.clone(),
        })
    }
}

impl SerialTransport for SystemPort {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(self.name.as_str(), self.settings.baud_rate)
            .data_bits(data_bits(self.settings.data_bits))
            .stop_bits(stop_bits(self.settings.stop_bits))
            .parity(parity(self.settings.parity))
            .flow_control(serialport::FlowControl::None)
            .timeout(self.write_timeout)
            .open()
            .map_err(|err| TransportError::Open {
                port: self.name.clone(),
                source: err.into(),
            })?;

        info!(port = %self.name, settings = %self.settings, "opened serial port");
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "closed serial port");
        }
    }

    fn set_line_settings(&mut self, settings: LineSettings) -> Result<()> {
        self.settings = settings;
        let Some(port) = self.port.as_mut() else {
            return Ok(());
        };

        let applied = port
            .set_baud_rate(settings.baud_rate)
            .and_then(|()| port.set_data_bits(data_bits(settings.data_bits)))
            .and_then(|()| port.set_stop_bits(stop_bits(settings.stop_bits)))
            .and_then(|()| port.set_parity(parity(settings.parity)));
        match applied {
            Ok(()) => {
                debug!(port = %self.name, %settings, "applied line settings");
                Ok(())
            }
            Err(err) => Err(self.configure_error(err)),
        }
    }

    fn set_break(&mut self) -> Result<()> {
        self.handle()?
            .set_break()
            .map_err(|err| self.configure_error(err))
    }

    fn clear_break(&mut self) -> Result<()> {
        self.handle()?
            .clear_break()
            .map_err(|err| self.configure_error(err))
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::NotOpen {
                port: self.name.clone(),
            });
        };

        let mut offset = 0usize;
        while offset < data.len() {
            match port.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        // Drain the UART so the next break cannot cut the tail of this frame.
        loop {
            match port.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for SystemPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPort")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("open", &self.port.is_some())
            .finish()
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_port_name() -> String {
        format!(
            "/dev/dmxline-missing-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        )
    }

    #[test]
    fn new_port_is_closed_with_dmx_settings() {
        let port = SystemPort::new("/dev/ttyUSB0");
        assert!(!port.is_open());
        assert_eq!(port.port_name(), "/dev/ttyUSB0");
        assert_eq!(port.settings(), LineSettings::DMX512);
    }

    #[test]
    fn open_missing_device_fails() {
        let mut port = SystemPort::new(missing_port_name());
        let result = port.open();
        assert!(matches!(result, Err(TransportError::Open { .. })));
        assert!(!port.is_open());
    }

    #[test]
    fn break_and_write_require_open_port() {
        let mut port = SystemPort::new(missing_port_name());
        assert!(matches!(
            port.set_break(),
            Err(TransportError::NotOpen { .. })
        ));
        assert!(matches!(
            port.clear_break(),
            Err(TransportError::NotOpen { .. })
        ));
        assert!(matches!(
            port.write_all(&[0u8; 4]),
            Err(TransportError::NotOpen { .. })
        ));
    }

    #[test]
    fn settings_on_closed_port_are_stored() {
        let mut port = SystemPort::new(missing_port_name());
        let slow = LineSettings {
            baud_rate: 9600,
            ..LineSettings::DMX512
        };
        port.set_line_settings(slow).expect("closed port should accept settings");
        assert_eq!(port.settings(), slow);
    }

    #[test]
    fn close_is_idempotent() {
        let mut port = SystemPort::new(missing_port_name());
        port.close();
        port.close();
        assert!(!port.is_open());
    }
}
