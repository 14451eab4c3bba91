//! Message framing for the micro:bit Firmata byte protocol.
//!
//! This is the core of mbfirmata. The serial link has no length prefixes or
//! checksums; instead:
//! - Command bytes have the high bit set, data bytes never do
//! - Channel commands carry a fixed, small number of argument bytes
//! - Sysex messages run from 0xF0 to 0xF7 with 7-bit packed payloads
//!
//! [`StreamFramer`] turns arbitrarily chunked input into [`Message`]s and
//! resynchronizes on the next command byte after any corruption. The
//! [`encoder`] module builds every outbound command.

pub mod encoder;
pub mod error;
pub mod framer;
pub mod message;
pub mod reader;
pub mod seven_bit;
pub mod wire;
pub mod writer;

#[cfg(feature = "async")]
pub mod codec;

#[cfg(feature = "async")]
pub use codec::FirmataCodec;
pub use error::{FrameError, Result};
pub use framer::{FramerConfig, FramerStats, StreamFramer, DEFAULT_BUFFER_CAPACITY};
pub use message::{ChannelClass, ChannelMessage, Message, SysexMessage};
pub use reader::MessageReader;
pub use wire::PinMode;
pub use writer::CommandWriter;
