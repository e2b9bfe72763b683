//! DMX512 line discipline validation and port discovery.

use dmxline_transport::{LineSettings, SerialTransport, SystemPort};
use tracing::{debug, warn};

use crate::error::{Result, SenderError};

/// Apply the DMX512 line settings to `transport` and prove it can open.
///
/// An open transport is closed first. After a successful trial open the
/// transport is closed again, so it is never left open on return. The
/// transport is handed back on success so the caller can keep using it.
pub fn configure<T: SerialTransport>(mut transport: T) -> Result<T> {
    if transport.is_open() {
        transport.close();
    }

    let port = transport.port_name().to_string();
    transport
        .set_line_settings(LineSettings::DMX512)
        .map_err(|source| SenderError::Config {
            port: port.clone(),
            source,
        })?;
    transport
        .open()
        .map_err(|source| SenderError::Config { port, source })?;
    transport.close();

    debug!(port = transport.port_name(), "port accepts DMX512 line settings");
    Ok(transport)
}

/// Names of the candidates that accept the DMX512 line discipline.
///
/// Candidates that fail configuration are skipped.
pub fn compatible_ports<T, I>(candidates: I) -> Vec<String>
where
    T: SerialTransport,
    I: IntoIterator<Item = T>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| match configure(candidate) {
            Ok(transport) => Some(transport.port_name().to_string()),
            Err(err) => {
                debug!(error = %err, "skipping incompatible port");
                None
            }
        })
        .collect()
}

/// System serial ports that accept the DMX512 line discipline.
///
/// Fails only when the system port list itself cannot be read.
pub fn try_list_compatible_ports() -> Result<Vec<String>> {
    let names = SystemPort::enumerate()?;
    Ok(compatible_ports(names.into_iter().map(SystemPort::new)))
}

/// Best-effort variant of [`try_list_compatible_ports`].
///
/// Enumeration failures are logged and reported as an empty list.
pub fn list_compatible_ports() -> Vec<String> {
    try_list_compatible_ports().unwrap_or_else(|err| {
        warn!(error = %err, "serial port enumeration failed");
        Vec::new()
    })
}
