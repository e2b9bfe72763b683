/// Errors that can occur in sender operations.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// The port does not accept the DMX512 line discipline.
    #[error("port {port} rejected DMX512 configuration: {source}")]
    Config {
        port: String,
        source: dmxline_transport::TransportError,
    },

    /// The port could not be opened to begin transmitting.
    #[error("failed to start transmission on {port}: {source}")]
    Start {
        port: String,
        source: dmxline_transport::TransportError,
    },

    /// Sender configuration values are unusable.
    #[error("invalid sender configuration: {0}")]
    InvalidConfig(String),

    /// Channel addressing error.
    #[error("channel error: {0}")]
    Frame(#[from] dmxline_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] dmxline_transport::TransportError),

    /// The transmission thread could not be created.
    #[error("failed to spawn transmission thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SenderError>;
