use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A connected board link that implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Reads deliver whatever bytes have arrived, with no alignment to protocol
/// messages; writes send raw command bytes.
pub struct BoardStream {
    inner: BoardStreamInner,
}

enum BoardStreamInner {
    Serial(Box<dyn serialport::SerialPort>),
    Tcp(TcpStream),
}

impl Read for BoardStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BoardStreamInner::Serial(port) => port.read(buf),
            BoardStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for BoardStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BoardStreamInner::Serial(port) => port.write(buf),
            BoardStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            BoardStreamInner::Serial(port) => port.flush(),
            BoardStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl BoardStream {
    pub(crate) fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: BoardStreamInner::Serial(port),
        }
    }

    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: BoardStreamInner::Tcp(stream),
        }
    }

    /// Set the read timeout on the underlying link.
    ///
    /// A read that times out returns `ErrorKind::TimedOut` (serial) or
    /// `ErrorKind::WouldBlock` (TCP); callers treat both as "nothing arrived yet".
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            BoardStreamInner::Serial(port) => {
                port.set_timeout(timeout).map_err(TransportError::Configure)
            }
            BoardStreamInner::Tcp(stream) => stream
                .set_read_timeout(Some(timeout))
                .map_err(TransportError::Io),
        }
    }

    /// Try to clone this stream.
    ///
    /// The clone shares the same device, so one handle can decode incoming
    /// bytes while another sends commands.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            BoardStreamInner::Serial(port) => {
                let cloned = port.try_clone().map_err(TransportError::Configure)?;
                Ok(Self::from_serial(cloned))
            }
            BoardStreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_tcp(cloned))
            }
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            BoardStreamInner::Serial(_) => "serial",
            BoardStreamInner::Tcp(_) => "tcp",
        }
    }

    /// Human-readable endpoint (port name or peer address), if known.
    pub fn endpoint(&self) -> Option<String> {
        match &self.inner {
            BoardStreamInner::Serial(port) => port.name(),
            BoardStreamInner::Tcp(stream) => stream.peer_addr().ok().map(|addr| addr.to_string()),
        }
    }
}

impl std::fmt::Debug for BoardStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStream")
            .field("type", &self.transport_name())
            .field("endpoint", &self.endpoint())
            .finish()
    }
}
