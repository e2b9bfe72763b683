/// Errors that can occur when addressing channels or building frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A channel index outside the universe was used.
    #[error("channel index {index} out of range (valid: 0..={max})")]
    ChannelOutOfRange { index: usize, max: usize },

    /// A bulk buffer did not hold exactly one universe of values.
    #[error("expected {expected} channel values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A frame started with something other than the null start code.
    #[error("invalid start code 0x{0:02X} (expected 0x00)")]
    InvalidStartCode(u8),
}

pub type Result<T> = std::result::Result<T, FrameError>;
