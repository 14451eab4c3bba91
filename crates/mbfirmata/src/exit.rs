use std::fmt;
use std::io;

use mbfirmata_board::BoardError;
use mbfirmata_frame::FrameError;
use mbfirmata_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn board_error(context: &str, err: BoardError) -> CliError {
    match err {
        BoardError::Transport(err) => transport_error(context, err),
        BoardError::Frame(err) => frame_error(context, err),
        BoardError::InvalidCommand(_) => CliError::new(USAGE, format!("{context}: {err}")),
        BoardError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn board_errors_map_to_exit_codes() {
        let timeout = BoardError::Timeout {
            query: "version query",
            waited: Duration::from_secs(1),
        };
        assert_eq!(board_error("info", timeout).code, TIMEOUT);

        let invalid = BoardError::InvalidCommand("touch".to_string());
        assert_eq!(board_error("send", invalid).code, USAGE);

        let closed = BoardError::Frame(FrameError::ConnectionClosed);
        assert_eq!(board_error("monitor", closed).code, FAILURE);
    }

    #[test]
    fn io_kinds_map_to_exit_codes() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(io_error("connect", refused).code, TRANSPORT_ERROR);

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let err = board_error("open", BoardError::Frame(FrameError::Io(denied)));
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.starts_with("open: "));
    }
}
