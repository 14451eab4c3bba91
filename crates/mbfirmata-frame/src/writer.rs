use std::io::{ErrorKind, Write};

use bytes::Bytes;
use tracing::trace;

use crate::error::{FrameError, Result};

/// Writes encoded commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    sent: u64,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer.
    pub fn new(inner: T) -> Self {
        Self { inner, sent: 0 }
    }

    /// Send a command built by [`crate::encoder`].
    ///
    /// `None` (a builder rejected its arguments) sends nothing and returns
    /// `Ok(false)`.
    pub fn send_command(&mut self, command: Option<Bytes>) -> Result<bool> {
        match command {
            Some(bytes) => {
                self.send(&bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write raw bytes (blocking) and flush.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        trace!(len = bytes.len(), "sent command bytes");
        self.sent += 1;

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Number of commands written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder;
    use crate::framer::StreamFramer;
    use crate::message::{ChannelMessage, Message};
    use crate::wire::PinMode;

    #[test]
    fn writes_encoded_commands() {
        let mut writer = CommandWriter::new(Vec::new());
        assert!(writer
            .send_command(encoder::set_pin_mode(1, PinMode::DigitalOutput))
            .unwrap());
        assert!(writer
            .send_command(encoder::set_digital_pin(1, true))
            .unwrap());

        assert_eq!(writer.sent(), 2);
        assert_eq!(writer.get_ref(), &vec![0xF4, 1, 1, 0xF5, 1, 1]);
    }

    #[test]
    fn rejected_command_writes_nothing() {
        let mut writer = CommandWriter::new(Vec::new());
        assert!(!writer
            .send_command(encoder::set_touch_mode(7, true))
            .unwrap());
        assert!(writer.get_ref().is_empty());
        assert_eq!(writer.sent(), 0);
    }

    #[test]
    fn output_frames_back_into_messages() {
        let mut writer = CommandWriter::new(Vec::new());
        writer
            .send_command(encoder::stream_analog_channel(8, true))
            .unwrap();
        writer.send(&encoder::system_reset()).unwrap();

        let bytes = writer.into_inner();
        let messages = StreamFramer::new().feed(&bytes);
        assert_eq!(
            messages,
            vec![
                Message::Channel(ChannelMessage::new(0xC8, 1, 0)),
                Message::Channel(ChannelMessage::new(0xFF, 0, 0)),
            ]
        );
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = CommandWriter::new(OneByteWriter(Vec::new()));
        writer.send(&encoder::display_clear()).unwrap();
        assert_eq!(writer.get_ref().0, vec![0xF0, 0x01, 0xF7]);
    }

    #[test]
    fn closed_stream_is_reported() {
        let mut writer = CommandWriter::new(ClosedWriter);
        let err = writer.send(&[0xFF]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn io_errors_propagate() {
        let mut writer = CommandWriter::new(BrokenPipe);
        let err = writer.send(&[0xFF]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct OneByteWriter(Vec<u8>);

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
