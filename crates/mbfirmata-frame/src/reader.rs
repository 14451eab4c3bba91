use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::error::{FrameError, Result};
use crate::framer::{FramerConfig, StreamFramer};
use crate::message::Message;

const READ_CHUNK_SIZE: usize = 256;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
pub struct MessageReader<T> {
    inner: T,
    framer: StreamFramer,
    ready: VecDeque<Message>,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FramerConfig::default())
    }

    /// Create a new message reader with explicit framer configuration.
    pub fn with_config(inner: T, config: FramerConfig) -> Self {
        Self {
            inner,
            framer: StreamFramer::with_config(config),
            ready: VecDeque::new(),
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached. Read
    /// timeouts surface as `FrameError::Io`; bytes already received stay
    /// buffered and the call can be retried.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(msg) = self.ready.pop_front() {
                return Ok(msg);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            let ready = &mut self.ready;
            self.framer
                .process_bytes(&chunk[..read], |msg| ready.push_back(msg));
        }
    }

    /// Read messages until EOF, returning everything decoded.
    pub fn read_to_end(&mut self) -> Result<Vec<Message>> {
        let mut out = Vec::new();
        loop {
            match self.read_message() {
                Ok(msg) => out.push(msg),
                Err(FrameError::ConnectionClosed) => return Ok(out),
                Err(err) => return Err(err),
            }
        }
    }

    /// The framer driving this reader.
    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::encoder;
    use crate::message::{ChannelMessage, SysexMessage};

    #[test]
    fn read_single_message() {
        let mut reader = MessageReader::new(Cursor::new(vec![0xE3, 0x10, 0x00]));
        let msg = reader.read_message().unwrap();
        assert_eq!(msg, Message::Channel(ChannelMessage::new(0xE3, 0x10, 0x00)));
    }

    #[test]
    fn read_multiple_messages() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&encoder::scroll_string("ok", 80).unwrap());
        wire.extend_from_slice(&[0x90, 0x01, 0x00]);
        wire.extend_from_slice(&encoder::request_firmware());

        let mut reader = MessageReader::new(Cursor::new(wire));
        let messages = reader.read_to_end().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            Message::Sysex(SysexMessage::new(0x04, vec![80, b'o', 0, b'k', 0]))
        );
        assert_eq!(messages[2], Message::Sysex(SysexMessage::new(0x79, vec![])));
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: vec![0xF0, 0x0D, 2, 0, 0, 3, 0, 0, 0xF7],
            pos: 0,
        };
        let mut reader = MessageReader::new(byte_reader);

        let msg = reader.read_message().unwrap();
        assert_eq!(
            msg,
            Message::Sysex(SysexMessage::new(0x0D, vec![2, 0, 0, 3, 0, 0]))
        );
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = MessageReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_message() {
        let mut reader = MessageReader::new(Cursor::new(vec![0xF0, 0x0E, b'h']));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.framer().pending(), &[0xF0, 0x0E, b'h']);
    }

    #[test]
    fn timeout_keeps_buffered_bytes() {
        let reader = TimeoutBetweenChunks {
            chunks: vec![vec![0xE0, 0x05], vec![0x00]],
            next: 0,
            timed_out: false,
        };
        let mut reader = MessageReader::new(reader);

        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));

        let msg = reader.read_message().unwrap();
        assert_eq!(msg, Message::Channel(ChannelMessage::new(0xE0, 0x05, 0x00)));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(vec![0xFF]),
        };
        let mut reader = MessageReader::new(reader);
        let msg = reader.read_message().unwrap();
        assert_eq!(msg, Message::Channel(ChannelMessage::new(0xFF, 0, 0)));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = MessageReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct TimeoutBetweenChunks {
        chunks: Vec<Vec<u8>>,
        next: usize,
        timed_out: bool,
    }

    impl Read for TimeoutBetweenChunks {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.next == 1 && !self.timed_out {
                self.timed_out = true;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            let Some(chunk) = self.chunks.get(self.next) else {
                return Ok(0);
            };
            self.next += 1;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
