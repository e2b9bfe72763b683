//! Serial transport abstraction for DMX512 output.
//!
//! Provides the device-level capability set a DMX512 transmitter needs:
//! - Line parameter control (the fixed 250 kbaud 8N2 discipline)
//! - Software break assertion and release
//! - Blocking contiguous writes
//!
//! This is the lowest layer of dmxline. Everything else builds on the
//! [`SerialTransport`] trait defined here. [`SystemPort`] drives real devices;
//! [`MemoryTransport`] records traffic for dry runs and tests.

pub mod error;
pub mod memory;
pub mod serial;
pub mod settings;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{MemoryProbe, MemoryTransport, TransportEvent};
pub use serial::SystemPort;
pub use settings::{DataBits, LineSettings, Parity, StopBits};
pub use traits::SerialTransport;
