use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Null start code used by standard dimmer-data frames.
pub const START_CODE: u8 = 0x00;

/// Number of channel slots in one universe.
pub const CHANNEL_COUNT: usize = 512;

/// Highest valid 0-based channel index.
pub const MAX_CHANNEL_INDEX: usize = CHANNEL_COUNT - 1;

/// Bytes on the wire per frame: start code plus every channel slot.
pub const FRAME_SIZE: usize = CHANNEL_COUNT + 1;

/// One complete DMX512 frame as it is written after a break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    bytes: Bytes,
}

impl DmxFrame {
    /// Build a frame carrying `channels` behind the null start code.
    pub fn from_channels(channels: &[u8; CHANNEL_COUNT]) -> Self {
        let mut buf = BytesMut::with_capacity(FRAME_SIZE);
        encode_frame(channels, &mut buf);
        Self {
            bytes: buf.freeze(),
        }
    }

    /// Check that `wire` is a well-formed null start code frame.
    pub fn parse(wire: &[u8]) -> Result<Self> {
        if wire.len() != FRAME_SIZE {
            return Err(FrameError::SizeMismatch {
                expected: FRAME_SIZE,
                actual: wire.len(),
            });
        }
        if wire[0] != START_CODE {
            return Err(FrameError::InvalidStartCode(wire[0]));
        }
        Ok(Self {
            bytes: Bytes::copy_from_slice(wire),
        })
    }

    /// The start code byte (always [`START_CODE`]).
    pub fn start_code(&self) -> u8 {
        self.bytes[0]
    }

    /// Channel values in slot order.
    pub fn channels(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Value of the channel at a 0-based index.
    pub fn channel(&self, index: usize) -> Result<u8> {
        self.channels()
            .get(index)
            .copied()
            .ok_or(FrameError::ChannelOutOfRange {
                index,
                max: MAX_CHANNEL_INDEX,
            })
    }

    /// Wire bytes of this frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for DmxFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode one universe into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬───────────┬─────┬─────────────┐
/// │ Start code │ Slot 1    │ Slot 2    │ ... │ Slot 512    │
/// │ 0x00       │ index 0   │ index 1   │     │ index 511   │
/// └────────────┴───────────┴───────────┴─────┴─────────────┘
/// ```
pub fn encode_frame(channels: &[u8; CHANNEL_COUNT], dst: &mut BytesMut) {
    dst.reserve(FRAME_SIZE);
    dst.put_u8(START_CODE);
    dst.put_slice(channels);
}
