/// Errors that can occur while talking to a board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mbfirmata_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] mbfirmata_frame::FrameError),

    /// A builder rejected the command arguments; nothing was sent.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The board did not answer a query in time.
    #[error("no reply to {query} after {waited:?}")]
    Timeout {
        query: &'static str,
        waited: std::time::Duration,
    },
}

impl From<std::io::Error> for BoardError {
    fn from(err: std::io::Error) -> Self {
        BoardError::Frame(mbfirmata_frame::FrameError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
