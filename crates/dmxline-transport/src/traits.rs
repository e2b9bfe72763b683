use crate::error::Result;
use crate::settings::LineSettings;

/// A serial device capable of carrying a DMX512 signal.
///
/// Implementations own the device handle. Opening applies the most recently
/// set [`LineSettings`]; setting them on an open device reconfigures it in
/// place. Break control and writes require the device to be open.
pub trait SerialTransport: Send {
    /// System name of the device (e.g. `/dev/ttyUSB0`, `COM3`).
    fn port_name(&self) -> &str;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Open the device. Opening an already open device is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Close the device. Closing a closed device is a no-op.
    fn close(&mut self);

    /// Set the line parameters used by this device.
    fn set_line_settings(&mut self, settings: LineSettings) -> Result<()>;

    /// Drive the line into the break condition.
    fn set_break(&mut self) -> Result<()>;

    /// Release the break condition (line returns to mark).
    fn clear_break(&mut self) -> Result<()>;

    /// Write all of `data` as one contiguous transmission (blocking).
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn port_name(&self) -> &str {
        (**self).port_name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn set_line_settings(&mut self, settings: LineSettings) -> Result<()> {
        (**self).set_line_settings(settings)
    }

    fn set_break(&mut self) -> Result<()> {
        (**self).set_break()
    }

    fn clear_break(&mut self) -> Result<()> {
        (**self).clear_break()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }
}
