use std::collections::BTreeMap;

use mbfirmata_frame::wire::{ANALOG_CHANNEL_COUNT, NO_VALUE, PIN_COUNT};
use mbfirmata_frame::PinMode;
use serde::Serialize;

/// One (mode, resolution) entry of a capability report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinCapability {
    pub mode: u8,
    pub resolution: u8,
}

impl PinCapability {
    /// The mode as a known [`PinMode`], if it is one.
    pub fn pin_mode(&self) -> Option<PinMode> {
        PinMode::from_byte(self.mode)
    }
}

/// Last reported mode and value of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinState {
    /// Raw mode byte; the board reports 0x7F for pins never configured.
    pub mode: u8,
    pub state: u32,
}

/// Everything the host knows about the board.
///
/// Only the dispatcher mutates this; consumers get a shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    /// Level of each digital input pin, indexed by pin number.
    pub digital_input: [bool; PIN_COUNT],
    /// Latest value of each analog channel, sign-corrected.
    pub analog_channel: [i16; ANALOG_CHANNEL_COUNT],
    /// `"Firmata Protocol <major>.<minor>"`, empty until reported.
    pub firmata_version: String,
    /// `"<name> <major>.<minor>"`, empty until reported.
    pub firmware_version: String,
    /// Supported modes per pin, from the last capability report.
    pub pin_capabilities: Vec<Vec<PinCapability>>,
    /// Analog channel per entry of the last mapping report.
    pub analog_mapping: Vec<Option<u8>>,
    /// Pin state reports keyed by pin.
    pub pin_states: BTreeMap<u8, PinState>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            digital_input: [false; PIN_COUNT],
            analog_channel: [0; ANALOG_CHANNEL_COUNT],
            firmata_version: String::new(),
            firmware_version: String::new(),
            pin_capabilities: Vec::new(),
            analog_mapping: Vec::new(),
            pin_states: BTreeMap::new(),
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digital level of `pin`, or `None` past the last pin.
    pub fn digital(&self, pin: usize) -> Option<bool> {
        self.digital_input.get(pin).copied()
    }

    /// Value of analog `channel`, or `None` past the last channel.
    pub fn analog(&self, channel: usize) -> Option<i16> {
        self.analog_channel.get(channel).copied()
    }

    /// True once both version strings have been reported.
    pub fn has_versions(&self) -> bool {
        !self.firmata_version.is_empty() && !self.firmware_version.is_empty()
    }

    pub(crate) fn set_digital_port(&mut self, port: u8, mask: u16) {
        for bit in 0..8usize {
            let pin = usize::from(port) * 8 + bit;
            if pin < PIN_COUNT {
                self.digital_input[pin] = mask & (1 << bit) != 0;
            }
        }
    }

    pub(crate) fn set_capabilities(&mut self, payload: &[u8]) {
        self.pin_capabilities = parse_capabilities(payload);
    }

    pub(crate) fn set_analog_mapping(&mut self, payload: &[u8]) {
        self.analog_mapping = payload
            .iter()
            .map(|&b| if b == NO_VALUE { None } else { Some(b) })
            .collect();
    }
}

/// Split a capability report into per-pin lists.
///
/// Pins are separated by 0x7F. A separator after the last pin is allowed, so
/// a trailing empty group is not counted as a pin.
fn parse_capabilities(payload: &[u8]) -> Vec<Vec<PinCapability>> {
    let mut pins = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    while i < payload.len() {
        if payload[i] == NO_VALUE {
            pins.push(std::mem::take(&mut current));
            i += 1;
            continue;
        }
        let Some(&resolution) = payload.get(i + 1) else {
            break;
        };
        current.push(PinCapability {
            mode: payload[i],
            resolution,
        });
        i += 2;
    }
    if !current.is_empty() {
        pins.push(current);
    }
    pins
}
