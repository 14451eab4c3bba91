use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use mbfirmata_frame::{CommandWriter, Message};
use mbfirmata_transport::{connect_tcp, BoardStream, SerialConfig, SerialLink};
use tracing::debug;

use crate::board::{Board, BoardConfig};
use crate::dispatch::Dispatched;
use crate::error::{BoardError, Result};

/// Read timeout applied to TCP bridges so polling never blocks for long.
const TCP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A board model wired to a live link.
///
/// Inbound bytes go through [`Board`]; outbound commands are written on a
/// cloned handle of the same link.
pub struct Connection {
    board: Board,
    reader: BoardStream,
    writer: CommandWriter<BoardStream>,
}

/// Open a serial port and attach a fresh board model to it.
pub fn open_serial(
    path: impl AsRef<Path>,
    serial: &SerialConfig,
    config: BoardConfig,
) -> Result<Connection> {
    let stream = SerialLink::open_with_config(path, serial)?;
    Connection::from_stream(stream, config)
}

/// Connect to a TCP serial bridge and attach a fresh board model to it.
pub fn open_tcp(addr: &str, config: BoardConfig) -> Result<Connection> {
    let mut stream = connect_tcp(addr)?;
    stream.set_timeout(TCP_POLL_INTERVAL)?;
    Connection::from_stream(stream, config)
}

impl Connection {
    /// Wrap an already opened link.
    pub fn from_stream(stream: BoardStream, config: BoardConfig) -> Result<Self> {
        let writer = CommandWriter::new(stream.try_clone()?);
        debug!(link = ?stream, "board connection ready");
        Ok(Self {
            board: Board::with_config(config),
            reader: stream,
            writer,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access, e.g. to register listeners.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Send a command built by `mbfirmata_frame::encoder`.
    ///
    /// A rejected builder (`None`) becomes [`BoardError::InvalidCommand`]
    /// naming `what`.
    pub fn send(&mut self, command: Option<Bytes>, what: &str) -> Result<()> {
        if self.writer.send_command(command)? {
            Ok(())
        } else {
            Err(BoardError::InvalidCommand(what.to_string()))
        }
    }

    /// Send raw bytes as-is.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.send(bytes)?;
        Ok(())
    }

    /// An independent writer on the same link.
    ///
    /// Listeners cannot reach back into the board they are registered on, so
    /// this is how they send replies.
    pub fn command_writer(&self) -> Result<CommandWriter<BoardStream>> {
        Ok(CommandWriter::new(self.reader.try_clone()?))
    }

    /// Read and decode whatever has arrived. Returns the byte count (0 on
    /// timeout).
    pub fn poll(&mut self) -> Result<usize> {
        self.board.pump(&mut self.reader)
    }

    pub fn poll_with<F>(&mut self, observer: F) -> Result<usize>
    where
        F: FnMut(&Message, &Dispatched),
    {
        self.board.pump_with(&mut self.reader, observer)
    }

    pub fn endpoint(&self) -> Option<String> {
        self.reader.endpoint()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("link", &self.reader)
            .field("board", &self.board)
            .finish()
    }
}
