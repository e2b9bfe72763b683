/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device could not be opened with the requested line settings.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: std::io::Error,
    },

    /// The device rejected a line parameter or break request.
    #[error("failed to configure {port}: {source}")]
    Configure {
        port: String,
        source: std::io::Error,
    },

    /// An operation that needs an open device was attempted on a closed one.
    #[error("port {port} is not open")]
    NotOpen { port: String },

    /// An I/O error occurred while writing to the device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The system port list could not be read.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(String),
}

impl TransportError {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. } | TransportError::Configure { source, .. } => {
                Some(source.kind())
            }
            TransportError::Io(err) => Some(err.kind()),
            TransportError::NotOpen { .. } | TransportError::Enumerate(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
