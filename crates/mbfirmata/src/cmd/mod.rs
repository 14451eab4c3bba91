use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use mbfirmata_frame::encoder::DEFAULT_SCROLL_DELAY;
use mbfirmata_frame::{PinMode, DEFAULT_BUFFER_CAPACITY};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod info;
pub mod link;
pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports and flag micro:bit boards.
    Ports(PortsArgs),
    /// Query protocol and firmware versions, pin capabilities and mappings.
    Info(InfoArgs),
    /// Stream decoded messages from a board.
    Monitor(MonitorArgs),
    /// Send one command to a board.
    Send(SendArgs),
    /// Decode a captured byte stream offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the board.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial port path. Default: first detected micro:bit.
    #[arg(long, short = 'p', env = "MBFIRMATA_PORT")]
    pub port: Option<PathBuf>,
    /// Connect to a TCP serial bridge (host:port) instead of a serial port.
    #[arg(long, value_name = "ADDR")]
    pub tcp: Option<String>,
    /// Serial line speed.
    #[arg(long, default_value_t = 57_600)]
    pub baud: u32,
    /// How long to wait for replies (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// Only list ports that look like a micro:bit.
    #[arg(long)]
    pub microbit: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Also query per-pin capabilities.
    #[arg(long)]
    pub capabilities: bool,
    /// Also query the analog channel mapping.
    #[arg(long)]
    pub mapping: bool,
    /// Also query the state of these pins (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "PINS")]
    pub pins: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Enable streaming for these analog channels (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "CHANNELS")]
    pub analog: Vec<u8>,
    /// Enable change reports for these digital ports (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "PORTS")]
    pub digital: Vec<u8>,
    /// Enable touch sensing on these pins (comma-separated, 0-2).
    #[arg(long, value_delimiter = ',', value_name = "PINS")]
    pub touch: Vec<u8>,
    /// Analog sampling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub interval: Option<u16>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Also print messages that have no effect on the board model.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(subcommand)]
    pub action: SendAction,
}

#[derive(Subcommand, Debug)]
pub enum SendAction {
    /// Set a pin mode (input, output, analog, pwm, pullup, pulldown).
    PinMode { pin: u8, mode: PinMode },
    /// Drive a digital output pin.
    Digital {
        pin: u8,
        #[arg(value_parser = link::parse_switch, action = clap::ArgAction::Set)]
        level: bool,
    },
    /// Write all pins of a digital port (mask as decimal, 0x.. or 0b..).
    Port {
        port: u8,
        #[arg(value_parser = link::parse_mask)]
        mask: u8,
    },
    /// Write a PWM / analog output value (0-16383).
    Analog { pin: u8, value: u16 },
    /// Scroll text across the display.
    Scroll {
        text: String,
        #[arg(long, default_value_t = DEFAULT_SCROLL_DELAY)]
        delay: u8,
    },
    /// Scroll a number across the display.
    #[command(allow_negative_numbers = true)]
    Number {
        value: i32,
        #[arg(long, default_value_t = DEFAULT_SCROLL_DELAY)]
        delay: u8,
    },
    /// Clear the display.
    Clear,
    /// Set one LED (brightness 0-255).
    Plot {
        x: u8,
        y: u8,
        #[arg(default_value_t = 255)]
        brightness: u8,
    },
    /// Show a 5x5 image given as five rows of digits 0-9, e.g. 09090.
    Show {
        #[arg(num_args = 5, value_name = "ROW")]
        rows: Vec<String>,
        /// Send brightness levels instead of on/off.
        #[arg(long)]
        grayscale: bool,
    },
    /// Turn touch sensing on or off for pins 0-2.
    Touch {
        pin: u8,
        #[arg(value_parser = link::parse_switch, action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set the analog sampling interval in milliseconds.
    Sampling { millis: u16 },
    /// Reset the board's Firmata state.
    Reset,
    /// Send raw bytes given as hex.
    Raw {
        #[arg(required = true, num_args = 1.., value_name = "HEX")]
        bytes: Vec<String>,
    },
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum InputFormat {
    /// Hex text if the input looks like hex, binary otherwise.
    #[default]
    Auto,
    Hex,
    Binary,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// How to read the capture.
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub input_format: InputFormat,
    /// Feed the framer in chunks of this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub chunk: Option<usize>,
    /// Framer buffer capacity.
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer: usize,
    /// Print only the final board state.
    #[arg(long)]
    pub state_only: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
