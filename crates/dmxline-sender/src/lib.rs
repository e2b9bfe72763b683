//! Continuous DMX512 transmission over a serial transport.
//!
//! This is the "just works" layer. Wrap a port in a [`Communicator`], set
//! channel values from any thread, and call [`Communicator::start`]: a single
//! background thread keeps emitting break + frame until
//! [`Communicator::stop`].
//!
//! ```no_run
//! use dmxline_sender::Communicator;
//!
//! # fn main() -> dmxline_sender::Result<()> {
//! let dmx = Communicator::open("/dev/ttyUSB0")?;
//! dmx.set_byte(0, 255)?;
//! dmx.start()?;
//! // ... update channels while the line refreshes ...
//! dmx.stop();
//! # Ok(())
//! # }
//! ```

pub mod communicator;
pub mod config;
pub mod error;
pub mod transmitter;
pub mod validator;

pub use communicator::Communicator;
pub use config::{
    SenderConfig, DEFAULT_BREAK_DURATION, DEFAULT_STOP_TIMEOUT, MIN_BREAK_DURATION,
};
pub use error::{Result, SenderError};
pub use transmitter::{TransmissionLoop, TransmitStats};
pub use validator::{
    compatible_ports, configure, list_compatible_ports, try_list_compatible_ports,
};
