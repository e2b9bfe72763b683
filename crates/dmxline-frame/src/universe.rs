use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, DmxFrame, CHANNEL_COUNT, MAX_CHANNEL_INDEX};
use crate::error::{FrameError, Result};

/// Shared table of the 512 channel values of one universe.
///
/// Every accessor takes the internal lock for exactly one operation, so a
/// transmitter copying the universe never holds producers off for longer
/// than the copy. The start code is not stored: it is emitted as
/// [`START_CODE`](crate::START_CODE) whenever a frame is encoded and no
/// write path can reach it.
#[derive(Debug)]
pub struct ChannelBuffer {
    channels: Mutex<[u8; CHANNEL_COUNT]>,
}

impl ChannelBuffer {
    /// Create a universe with every channel at zero.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new([0u8; CHANNEL_COUNT]),
        }
    }

    /// Current value of the channel at a 0-based index.
    pub fn get(&self, index: usize) -> Result<u8> {
        check_index(index)?;
        Ok(self.lock()[index])
    }

    /// Set the channel at a 0-based index.
    pub fn set(&self, index: usize, value: u8) -> Result<()> {
        check_index(index)?;
        self.lock()[index] = value;
        Ok(())
    }

    /// Consistent copy of all channel values.
    pub fn get_all(&self) -> [u8; CHANNEL_COUNT] {
        *self.lock()
    }

    /// Replace every channel value.
    ///
    /// `values` must hold exactly [`CHANNEL_COUNT`] entries; anything else is
    /// rejected and the universe is left untouched.
    pub fn set_all(&self, values: &[u8]) -> Result<()> {
        let values: &[u8; CHANNEL_COUNT] =
            values.try_into().map_err(|_| FrameError::SizeMismatch {
                expected: CHANNEL_COUNT,
                actual: values.len(),
            })?;
        *self.lock() = *values;
        trace!("replaced all channel values");
        Ok(())
    }

    /// Set every channel back to zero.
    pub fn clear(&self) {
        *self.lock() = [0u8; CHANNEL_COUNT];
        trace!("cleared all channel values");
    }

    /// Snapshot of the universe as a wire frame.
    pub fn frame(&self) -> DmxFrame {
        DmxFrame::from_channels(&self.get_all())
    }

    /// Encode a snapshot of the universe into `dst` (appending).
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let channels = self.get_all();
        encode_frame(&channels, dst);
    }

    fn lock(&self) -> MutexGuard<'_, [u8; CHANNEL_COUNT]> {
        // The guarded data is plain bytes; a panicked writer cannot leave it invalid.
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChannelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn check_index(index: usize) -> Result<()> {
    if index > MAX_CHANNEL_INDEX {
        return Err(FrameError::ChannelOutOfRange {
            index,
            max: MAX_CHANNEL_INDEX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::codec::{FRAME_SIZE, START_CODE};

    #[test]
    fn new_buffer_is_all_zero() {
        let buffer = ChannelBuffer::new();
        assert_eq!(buffer.get_all(), [0u8; CHANNEL_COUNT]);
    }

    #[test]
    fn set_then_get_every_index_and_value() {
        let buffer = ChannelBuffer::new();
        for index in 0..CHANNEL_COUNT {
            for value in [0u8, 1, 127, 128, 254, 255] {
                buffer.set(index, value).expect("index should be valid");
                assert_eq!(buffer.get(index), Ok(value));
            }
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let buffer = ChannelBuffer::new();
        for index in [CHANNEL_COUNT, CHANNEL_COUNT + 1, 1000, usize::MAX] {
            let expected: Result<u8> = Err(FrameError::ChannelOutOfRange {
                index,
                max: MAX_CHANNEL_INDEX,
            });
            assert_eq!(buffer.get(index), expected);
            assert_eq!(buffer.set(index, 1), expected.map(|_| ()));
        }
        assert_eq!(buffer.get_all(), [0u8; CHANNEL_COUNT]);
    }

    #[test]
    fn set_all_wrong_length_leaves_state_unchanged() {
        let buffer = ChannelBuffer::new();
        buffer.set(10, 42).expect("index should be valid");

        for len in [0usize, 1, CHANNEL_COUNT - 1, FRAME_SIZE, 1024] {
            let values = vec![0xAA; len];
            assert_eq!(
                buffer.set_all(&values),
                Err(FrameError::SizeMismatch {
                    expected: CHANNEL_COUNT,
                    actual: len
                })
            );
        }

        let mut expected = [0u8; CHANNEL_COUNT];
        expected[10] = 42;
        assert_eq!(buffer.get_all(), expected);
    }

    #[test]
    fn set_all_then_get_all_preserves_order() {
        let buffer = ChannelBuffer::new();
        let values: Vec<u8> = (0..CHANNEL_COUNT).map(|i| (i * 7 % 256) as u8).collect();

        buffer.set_all(&values).expect("full universe should be accepted");
        assert_eq!(buffer.get_all().as_slice(), values.as_slice());
    }

    #[test]
    fn get_all_is_a_snapshot() {
        let buffer = ChannelBuffer::new();
        let snapshot = buffer.get_all();
        buffer.set(0, 200).expect("index should be valid");
        assert_eq!(snapshot[0], 0);
        assert_eq!(buffer.get(0), Ok(200));
    }

    #[test]
    fn frame_start_code_stays_zero() {
        let buffer = ChannelBuffer::new();
        buffer
            .set_all(&[0xFF; CHANNEL_COUNT])
            .expect("full universe should be accepted");
        buffer.set(0, 0xFF).expect("index should be valid");

        let frame = buffer.frame();
        assert_eq!(frame.start_code(), START_CODE);
        assert_eq!(frame.as_bytes().len(), FRAME_SIZE);
        assert!(frame.channels().iter().all(|&v| v == 0xFF));

        let mut wire = BytesMut::new();
        buffer.encode_into(&mut wire);
        assert_eq!(wire[0], START_CODE);
    }

    #[test]
    fn clear_resets_all_channels() {
        let buffer = ChannelBuffer::new();
        buffer
            .set_all(&[3; CHANNEL_COUNT])
            .expect("full universe should be accepted");
        buffer.clear();
        assert_eq!(buffer.get_all(), [0u8; CHANNEL_COUNT]);
    }

    #[test]
    fn concurrent_writers_to_distinct_channels_do_not_interfere() {
        let buffer = Arc::new(ChannelBuffer::new());
        let workers: Vec<_> = (0..8usize)
            .map(|worker| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for round in 0..200usize {
                        for index in (worker..CHANNEL_COUNT).step_by(8) {
                            let value = ((index + round) % 256) as u8;
                            buffer.set(index, value).expect("index should be valid");
                        }
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("writer thread should finish");
        }

        let final_round = 199usize;
        for index in 0..CHANNEL_COUNT {
            assert_eq!(
                buffer.get(index),
                Ok(((index + final_round) % 256) as u8),
                "channel {index} lost its last write"
            );
        }
    }
}
