use bytes::Bytes;

use crate::seven_bit;
use crate::wire::{
    ANALOG_UPDATE, DIGITAL_UPDATE, PROTOCOL_VERSION, SET_DIGITAL_PIN, SET_PIN_MODE,
    STREAM_ANALOG, STREAM_DIGITAL, SYSTEM_RESET,
};

/// What a channel command means, derived from its command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClass {
    DigitalUpdate,
    AnalogUpdate,
    ProtocolVersion,
    StreamAnalog,
    StreamDigital,
    SetPinMode,
    SetDigitalPin,
    Reset,
    /// Any other command byte; consumed by the framer but carries no meaning.
    Other,
}

impl ChannelClass {
    /// Classify a command byte.
    pub fn of(command: u8) -> Self {
        match command {
            PROTOCOL_VERSION => ChannelClass::ProtocolVersion,
            SET_PIN_MODE => ChannelClass::SetPinMode,
            SET_DIGITAL_PIN => ChannelClass::SetDigitalPin,
            SYSTEM_RESET => ChannelClass::Reset,
            _ => match command & 0xF0 {
                DIGITAL_UPDATE => ChannelClass::DigitalUpdate,
                ANALOG_UPDATE => ChannelClass::AnalogUpdate,
                STREAM_ANALOG => ChannelClass::StreamAnalog,
                STREAM_DIGITAL => ChannelClass::StreamDigital,
                _ => ChannelClass::Other,
            },
        }
    }
}

/// A short command: class in the top nibble, port/channel in the bottom nibble.
///
/// Missing argument bytes read as zero; extra ones are dropped by the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    pub command: u8,
    pub arg1: u8,
    pub arg2: u8,
}

impl ChannelMessage {
    pub fn new(command: u8, arg1: u8, arg2: u8) -> Self {
        Self {
            command,
            arg1,
            arg2,
        }
    }

    pub fn class(&self) -> ChannelClass {
        ChannelClass::of(self.command)
    }

    /// Port or channel number (low nibble of the command byte).
    pub fn channel(&self) -> u8 {
        self.command & 0x0F
    }

    /// Both arguments combined as `arg1 | arg2 << 7`.
    pub fn value14(&self) -> u16 {
        seven_bit::join14(self.arg1, self.arg2)
    }
}

/// A delimiter-terminated extended command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysexMessage {
    pub subcommand: u8,
    /// Bytes between the subcommand and the terminator.
    pub payload: Bytes,
}

impl SysexMessage {
    pub fn new(subcommand: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            subcommand,
            payload: payload.into(),
        }
    }

    /// The total wire size (start, subcommand, payload, terminator).
    pub fn wire_size(&self) -> usize {
        self.payload.len() + 3
    }
}

/// A complete message recovered from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Channel(ChannelMessage),
    Sysex(SysexMessage),
}

impl Message {
    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Message::Channel(msg) => crate::wire::command_name(msg.command),
            Message::Sysex(msg) => crate::wire::sysex_name(msg.subcommand),
        }
    }
}

impl From<ChannelMessage> for Message {
    fn from(msg: ChannelMessage) -> Self {
        Message::Channel(msg)
    }
}

impl From<SysexMessage> for Message {
    fn from(msg: SysexMessage) -> Self {
        Message::Sysex(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_command_bytes() {
        assert_eq!(ChannelClass::of(0x90), ChannelClass::DigitalUpdate);
        assert_eq!(ChannelClass::of(0x9F), ChannelClass::DigitalUpdate);
        assert_eq!(ChannelClass::of(0xE3), ChannelClass::AnalogUpdate);
        assert_eq!(ChannelClass::of(0xC1), ChannelClass::StreamAnalog);
        assert_eq!(ChannelClass::of(0xD2), ChannelClass::StreamDigital);
        assert_eq!(ChannelClass::of(0xF4), ChannelClass::SetPinMode);
        assert_eq!(ChannelClass::of(0xF5), ChannelClass::SetDigitalPin);
        assert_eq!(ChannelClass::of(0xF9), ChannelClass::ProtocolVersion);
        assert_eq!(ChannelClass::of(0xFF), ChannelClass::Reset);
        assert_eq!(ChannelClass::of(0xA0), ChannelClass::Other);
        assert_eq!(ChannelClass::of(0xF1), ChannelClass::Other);
    }

    #[test]
    fn channel_fields() {
        let msg = ChannelMessage::new(0xE5, 0x01, 0x40);
        assert_eq!(msg.channel(), 5);
        assert_eq!(msg.value14(), 8193);
        assert_eq!(Message::from(msg).label(), "ANALOG_UPDATE");
    }

    #[test]
    fn sysex_wire_size() {
        let msg = SysexMessage::new(0x0D, vec![1, 0, 0, 1, 0, 0]);
        assert_eq!(msg.wire_size(), 9);
        assert_eq!(Message::from(msg).label(), "REPORT_EVENT");
    }
}
