//! DMX512 output over RS-485 serial adapters.
//!
//! dmxline keeps a 512-channel universe in memory and refreshes it on a
//! serial line with DMX512 timing, while any number of threads update
//! channel values.
//!
//! # Crate Structure
//!
//! - [`transport`] - Serial device abstraction (line settings, break, writes)
//! - [`frame`] - Universe buffer and wire frame encoding
//! - [`sender`] - Port validation and the transmission lifecycle (behind `sender` feature)

/// Re-export transport types.
pub mod transport {
    pub use dmxline_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dmxline_frame::*;
}

/// Re-export sender types (requires `sender` feature).
#[cfg(feature = "sender")]
pub mod sender {
    pub use dmxline_sender::*;
}
