use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::message::{ChannelMessage, Message, SysexMessage};
use crate::wire::{is_command_byte, required_args, SYSEX_END, SYSEX_START};

/// Default input buffer size, matching the board's own receive buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 250;

/// Configuration for the stream framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Maximum number of pending bytes held between calls. Default: 250.
    pub buffer_capacity: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Counters for bytes the framer consumed without producing a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Complete messages handed to the sink.
    pub messages: u64,
    /// Data bytes that did not belong to any command.
    pub stray_bytes: u64,
    /// Sysex messages skipped because the terminator was not where expected.
    pub discarded_sysex: u64,
    /// Bytes thrown away because a single command outgrew the buffer.
    pub dropped_bytes: u64,
}

enum Step {
    /// The command at the cursor needs more bytes.
    Incomplete,
    /// Consume this many bytes without emitting anything.
    Skip(usize),
    /// A sysex without its terminator; consume this many bytes.
    Discard(usize),
    /// Consume this many bytes and emit the message.
    Emit(usize, Message),
}

/// Reassembles messages from an arbitrarily chunked byte stream.
///
/// Boundaries are found by scanning for bytes with the high bit set: the next
/// command byte always ends the current command, so a corrupt region can never
/// swallow more than one message. Only the most recent command in the buffer
/// depends on the argument-count table to decide whether it is complete.
///
/// Messages are emitted in arrival order, and every complete message is
/// emitted before [`process_bytes`](Self::process_bytes) returns.
#[derive(Debug)]
pub struct StreamFramer {
    buf: BytesMut,
    config: FramerConfig,
    stats: FramerStats,
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFramer {
    /// Create a framer with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(config: FramerConfig) -> Self {
        let config = FramerConfig {
            buffer_capacity: config.buffer_capacity.max(1),
        };
        Self {
            buf: BytesMut::with_capacity(config.buffer_capacity),
            config,
            stats: FramerStats::default(),
        }
    }

    /// Append `data` and hand every complete message to `sink`.
    ///
    /// Input larger than the free space is taken in pieces, draining complete
    /// messages in between, so chunking never changes what is emitted. If a
    /// single unfinished command fills the whole buffer it can never complete;
    /// it is dropped and scanning resumes with the new bytes.
    pub fn process_bytes<F>(&mut self, data: &[u8], mut sink: F)
    where
        F: FnMut(Message),
    {
        let mut rest = data;
        while !rest.is_empty() {
            let space = self.config.buffer_capacity - self.buf.len();
            if space == 0 {
                warn!(
                    pending = self.buf.len(),
                    "input buffer full with an unfinished command, dropping it"
                );
                self.stats.dropped_bytes += self.buf.len() as u64;
                self.buf.clear();
                continue;
            }

            let take = space.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            self.drain(&mut sink);
        }
    }

    /// Feed bytes and collect the emitted messages.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Message> {
        let mut out = Vec::new();
        self.process_bytes(data, |msg| out.push(msg));
        out
    }

    /// Bytes waiting for the rest of their command.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Discard pending bytes. Counters are kept.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    fn drain<F>(&mut self, sink: &mut F)
    where
        F: FnMut(Message),
    {
        let mut cursor = 0usize;
        loop {
            let Some(start) = find_command(&self.buf, cursor) else {
                // No command starts anywhere in the rest of the buffer.
                self.stats.stray_bytes += (self.buf.len() - cursor) as u64;
                self.buf.clear();
                return;
            };
            self.stats.stray_bytes += (start - cursor) as u64;

            // A terminator with no open sysex still ends the previous
            // command, but carries nothing itself.
            if self.buf[start] == SYSEX_END {
                self.stats.stray_bytes += 1;
                cursor = start + 1;
                continue;
            }

            match self.step(start) {
                Step::Incomplete => {
                    self.buf.advance(start);
                    return;
                }
                Step::Skip(len) => cursor = start + len,
                Step::Discard(len) => {
                    debug!(len, "sysex terminator missing, skipping message");
                    self.stats.discarded_sysex += 1;
                    cursor = start + len;
                }
                Step::Emit(len, msg) => {
                    trace!(kind = msg.label(), len, "framed message");
                    self.stats.messages += 1;
                    sink(msg);
                    cursor = start + len;
                }
            }
        }
    }

    fn step(&self, start: usize) -> Step {
        let buf = &self.buf[..];
        let command = buf[start];
        let args_start = start + 1;

        let arg_count = match find_command(buf, args_start) {
            Some(next) => next - args_start,
            None => {
                // Sysex is delimiter-terminated; without a later command byte
                // its end has not arrived yet.
                if command == SYSEX_START {
                    return Step::Incomplete;
                }
                let available = buf.len() - args_start;
                if available < required_args(command) {
                    return Step::Incomplete;
                }
                available
            }
        };

        if command == SYSEX_START {
            let end = args_start + arg_count;
            if buf[end] != SYSEX_END {
                return Step::Discard(arg_count + 1);
            }
            if arg_count == 0 {
                return Step::Skip(2);
            }
            let msg = SysexMessage::new(
                buf[args_start],
                Bytes::copy_from_slice(&buf[args_start + 1..end]),
            );
            return Step::Emit(arg_count + 2, msg.into());
        }

        let arg = |i: usize| if i < arg_count { buf[args_start + i] } else { 0 };
        let msg = ChannelMessage::new(command, arg(0), arg(1));
        Step::Emit(arg_count + 1, msg.into())
    }
}

fn find_command(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .iter()
        .position(|&b| is_command_byte(b))
        .map(|pos| from + pos)
}
