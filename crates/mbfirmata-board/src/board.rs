use std::io::{ErrorKind, Read};
use std::time::Duration;

use mbfirmata_frame::{FrameError, FramerConfig, FramerStats, Message, StreamFramer};

use crate::dispatch::{Dispatched, Dispatcher};
use crate::error::Result;
use crate::listeners::ListenerId;
use crate::state::DeviceState;

const PUMP_CHUNK_SIZE: usize = 256;

/// Board behavior settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Input buffer settings for the framer.
    pub framer: FramerConfig,
    /// How long [`crate::Connection`] queries wait for a reply.
    pub query_timeout: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            framer: FramerConfig::default(),
            query_timeout: Duration::from_secs(3),
        }
    }
}

/// Host-side model of one board: framer, state and listeners.
///
/// Feed it every byte received from the link with
/// [`process_bytes`](Self::process_bytes). All decoding, state updates and
/// listener calls finish before that call returns.
#[derive(Debug)]
pub struct Board {
    framer: StreamFramer,
    dispatcher: Dispatcher,
    config: BoardConfig,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_config(BoardConfig::default())
    }

    pub fn with_config(config: BoardConfig) -> Self {
        Self {
            framer: StreamFramer::with_config(config.framer),
            dispatcher: Dispatcher::new(),
            config,
        }
    }

    /// Decode a chunk of received bytes.
    pub fn process_bytes(&mut self, data: &[u8]) {
        self.process_bytes_with(data, |_, _| {});
    }

    /// Decode a chunk of received bytes, reporting each message and its effect.
    pub fn process_bytes_with<F>(&mut self, data: &[u8], mut observer: F)
    where
        F: FnMut(&Message, &Dispatched),
    {
        let dispatcher = &mut self.dispatcher;
        self.framer.process_bytes(data, |msg| {
            let outcome = dispatcher.handle(&msg);
            observer(&msg, &outcome);
        });
    }

    /// Read one chunk from `reader` and decode it.
    ///
    /// Returns the number of bytes read. A read timeout counts as zero bytes;
    /// end of stream is reported as `FrameError::ConnectionClosed`.
    pub fn pump<R: Read>(&mut self, reader: &mut R) -> Result<usize> {
        self.pump_with(reader, |_, _| {})
    }

    pub fn pump_with<R, F>(&mut self, reader: &mut R, observer: F) -> Result<usize>
    where
        R: Read,
        F: FnMut(&Message, &Dispatched),
    {
        let mut chunk = [0u8; PUMP_CHUNK_SIZE];
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Err(FrameError::ConnectionClosed.into()),
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                return Ok(0)
            }
            Err(err) => return Err(err.into()),
        };
        self.process_bytes_with(&chunk[..read], observer);
        Ok(read)
    }

    pub fn state(&self) -> &DeviceState {
        self.dispatcher.state()
    }

    /// Register a `(source_id, event_id)` listener.
    pub fn add_event_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(u32, u32) + Send + 'static,
    {
        self.dispatcher.listeners_mut().add_event_listener(listener)
    }

    /// Register a listener run after every analog update.
    pub fn add_update_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut() + Send + 'static,
    {
        self.dispatcher.listeners_mut().add_update_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.listeners_mut().remove(id)
    }

    pub fn stats(&self) -> FramerStats {
        self.framer.stats()
    }

    /// Bytes held back waiting for the rest of a command.
    pub fn pending(&self) -> &[u8] {
        self.framer.pending()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}
