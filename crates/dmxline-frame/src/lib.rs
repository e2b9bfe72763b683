//! DMX512 universe buffer and wire frame encoding.
//!
//! A universe is 512 one-byte channel slots. On the wire every transmission
//! carries:
//! - A 1-byte start code, always `0x00` for dimmer data
//! - 512 channel bytes in ascending slot order
//!
//! Channels are addressed with 0-based indices: index 0 is DMX slot 1.

pub mod codec;
pub mod error;
pub mod universe;

pub use codec::{
    encode_frame, DmxFrame, CHANNEL_COUNT, FRAME_SIZE, MAX_CHANNEL_INDEX, START_CODE,
};
pub use error::{FrameError, Result};
pub use universe::ChannelBuffer;
