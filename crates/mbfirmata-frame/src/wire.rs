//! Wire-level constants.
//!
//! Command bytes have the high bit set; every data byte is 0x00-0x7F. Channel
//! commands carry a port/channel number in their low nibble.

/// Digital port update (low nibble = port).
pub const DIGITAL_UPDATE: u8 = 0x90;
/// Analog channel stream toggle (low nibble = channel).
pub const STREAM_ANALOG: u8 = 0xC0;
/// Digital port stream toggle (low nibble = port).
pub const STREAM_DIGITAL: u8 = 0xD0;
/// Analog channel update (low nibble = channel).
pub const ANALOG_UPDATE: u8 = 0xE0;
/// Start of a sysex message.
pub const SYSEX_START: u8 = 0xF0;
/// Set pin mode: `[pin, mode]`.
pub const SET_PIN_MODE: u8 = 0xF4;
/// Set a single digital pin: `[pin, value]`.
pub const SET_DIGITAL_PIN: u8 = 0xF5;
/// End of a sysex message.
pub const SYSEX_END: u8 = 0xF7;
/// Protocol version report/request: `[major, minor]`.
pub const PROTOCOL_VERSION: u8 = 0xF9;
/// System reset, no arguments.
pub const SYSTEM_RESET: u8 = 0xFF;

// Sysex subcommands (first byte after SYSEX_START).
pub const DISPLAY_CLEAR: u8 = 0x01;
pub const DISPLAY_SHOW: u8 = 0x02;
pub const DISPLAY_PLOT: u8 = 0x03;
pub const SCROLL_STRING: u8 = 0x04;
pub const SCROLL_INTEGER: u8 = 0x05;
pub const SET_TOUCH_MODE: u8 = 0x06;
pub const REPORT_EVENT: u8 = 0x0D;
pub const DEBUG_STRING: u8 = 0x0E;
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
pub const CAPABILITY_QUERY: u8 = 0x6B;
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
pub const PIN_STATE_QUERY: u8 = 0x6D;
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
pub const EXTENDED_ANALOG: u8 = 0x6F;
pub const REPORT_FIRMWARE: u8 = 0x79;
pub const SAMPLING_INTERVAL: u8 = 0x7A;

/// Number of addressable pins on the board.
pub const PIN_COUNT: usize = 21;
/// Number of analog channels (pins plus mapped sensors).
pub const ANALOG_CHANNEL_COUNT: usize = 16;
/// Highest port/channel number a channel command can address.
pub const MAX_CHANNEL: u8 = 0x0F;
/// Separator between pins in a capability response, and "no channel" in an analog mapping.
pub const NO_VALUE: u8 = 0x7F;

// Event source ids reported by the board firmware.
pub const SOURCE_BUTTON_A: u32 = 1;
pub const SOURCE_BUTTON_B: u32 = 2;
pub const SOURCE_DISPLAY: u32 = 6;
pub const SOURCE_TOUCH_P0: u32 = 7;
pub const SOURCE_TOUCH_P1: u32 = 8;
pub const SOURCE_TOUCH_P2: u32 = 9;
pub const SOURCE_GESTURE: u32 = 27;

/// Pin modes understood by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    DigitalInput,
    DigitalOutput,
    AnalogInput,
    Pwm,
    PullUpInput,
    /// Board-specific extension.
    PullDownInput,
}

impl PinMode {
    /// Wire value of this mode.
    pub fn as_byte(self) -> u8 {
        match self {
            PinMode::DigitalInput => 0x00,
            PinMode::DigitalOutput => 0x01,
            PinMode::AnalogInput => 0x02,
            PinMode::Pwm => 0x03,
            PinMode::PullUpInput => 0x0B,
            PinMode::PullDownInput => 0x0F,
        }
    }

    /// Parse a wire value; unknown modes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(PinMode::DigitalInput),
            0x01 => Some(PinMode::DigitalOutput),
            0x02 => Some(PinMode::AnalogInput),
            0x03 => Some(PinMode::Pwm),
            0x0B => Some(PinMode::PullUpInput),
            0x0F => Some(PinMode::PullDownInput),
            _ => None,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            PinMode::DigitalInput => "input",
            PinMode::DigitalOutput => "output",
            PinMode::AnalogInput => "analog",
            PinMode::Pwm => "pwm",
            PinMode::PullUpInput => "pullup",
            PinMode::PullDownInput => "pulldown",
        }
    }
}

impl std::str::FromStr for PinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(PinMode::DigitalInput),
            "output" => Ok(PinMode::DigitalOutput),
            "analog" => Ok(PinMode::AnalogInput),
            "pwm" => Ok(PinMode::Pwm),
            "pullup" => Ok(PinMode::PullUpInput),
            "pulldown" => Ok(PinMode::PullDownInput),
            other => Err(format!("unknown pin mode: {other}")),
        }
    }
}

/// Returns true if the byte starts a command (high bit set).
pub fn is_command_byte(byte: u8) -> bool {
    byte & 0x80 != 0
}

/// Number of argument bytes a channel command needs when nothing follows it.
///
/// Sysex has no fixed length and is not covered here.
pub fn required_args(command: u8) -> usize {
    if command == SYSTEM_RESET {
        return 0;
    }
    match command & 0xF0 {
        STREAM_ANALOG | STREAM_DIGITAL => 1,
        _ => 2,
    }
}

/// Returns a human-readable name for a command byte.
pub fn command_name(command: u8) -> &'static str {
    match command {
        SYSEX_START => "SYSEX",
        SET_PIN_MODE => "SET_PIN_MODE",
        SET_DIGITAL_PIN => "SET_DIGITAL_PIN",
        SYSEX_END => "SYSEX_END",
        PROTOCOL_VERSION => "PROTOCOL_VERSION",
        SYSTEM_RESET => "SYSTEM_RESET",
        _ => match command & 0xF0 {
            DIGITAL_UPDATE => "DIGITAL_UPDATE",
            STREAM_ANALOG => "STREAM_ANALOG",
            STREAM_DIGITAL => "STREAM_DIGITAL",
            ANALOG_UPDATE => "ANALOG_UPDATE",
            _ => "UNKNOWN",
        },
    }
}

/// Returns a human-readable name for a sysex subcommand.
pub fn sysex_name(subcommand: u8) -> &'static str {
    match subcommand {
        DISPLAY_CLEAR => "DISPLAY_CLEAR",
        DISPLAY_SHOW => "DISPLAY_SHOW",
        DISPLAY_PLOT => "DISPLAY_PLOT",
        SCROLL_STRING => "SCROLL_STRING",
        SCROLL_INTEGER => "SCROLL_INTEGER",
        SET_TOUCH_MODE => "SET_TOUCH_MODE",
        REPORT_EVENT => "REPORT_EVENT",
        DEBUG_STRING => "DEBUG_STRING",
        ANALOG_MAPPING_QUERY => "ANALOG_MAPPING_QUERY",
        ANALOG_MAPPING_RESPONSE => "ANALOG_MAPPING_RESPONSE",
        CAPABILITY_QUERY => "CAPABILITY_QUERY",
        CAPABILITY_RESPONSE => "CAPABILITY_RESPONSE",
        PIN_STATE_QUERY => "PIN_STATE_QUERY",
        PIN_STATE_RESPONSE => "PIN_STATE_RESPONSE",
        EXTENDED_ANALOG => "EXTENDED_ANALOG",
        REPORT_FIRMWARE => "REPORT_FIRMWARE",
        SAMPLING_INTERVAL => "SAMPLING_INTERVAL",
        _ => "UNKNOWN",
    }
}

/// Returns a human-readable name for an event source id.
pub fn source_name(source_id: u32) -> &'static str {
    match source_id {
        SOURCE_BUTTON_A => "BUTTON_A",
        SOURCE_BUTTON_B => "BUTTON_B",
        SOURCE_DISPLAY => "DISPLAY",
        SOURCE_TOUCH_P0 => "TOUCH_P0",
        SOURCE_TOUCH_P1 => "TOUCH_P1",
        SOURCE_TOUCH_P2 => "TOUCH_P2",
        SOURCE_GESTURE => "GESTURE",
        _ => "OTHER",
    }
}
