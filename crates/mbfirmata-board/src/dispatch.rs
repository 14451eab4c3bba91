//! Interpretation of framed messages.
//!
//! The dispatcher is the only writer of [`DeviceState`]. Messages it does not
//! understand are consumed without effect; decoding never fails.

use mbfirmata_frame::wire::{
    ANALOG_MAPPING_RESPONSE, CAPABILITY_RESPONSE, DEBUG_STRING, PIN_STATE_RESPONSE,
    REPORT_EVENT, REPORT_FIRMWARE,
};
use mbfirmata_frame::{seven_bit, ChannelClass, ChannelMessage, Message, SysexMessage};
use serde::Serialize;
use tracing::{debug, trace};

use crate::listeners::ListenerRegistry;
use crate::state::{DeviceState, PinState};

/// What a message did to the board model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatched {
    DigitalPort { port: u8, mask: u16 },
    Analog { channel: u8, value: i16 },
    ProtocolVersion { version: String },
    Event { source_id: u32, event_id: u32 },
    DebugString { text: String },
    Firmware { version: String },
    Capabilities { pins: usize },
    AnalogMapping { entries: usize },
    PinState { pin: u8, mode: u8, state: u32 },
    /// Recognized framing but no meaning on the host side.
    Ignored,
}

/// Applies messages to a [`DeviceState`] and notifies listeners.
#[derive(Debug, Default)]
pub struct Dispatcher {
    state: DeviceState,
    listeners: ListenerRegistry,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    /// Apply one message. Listeners have all run when this returns.
    pub fn handle(&mut self, message: &Message) -> Dispatched {
        let outcome = match message {
            Message::Channel(msg) => self.handle_channel(msg),
            Message::Sysex(msg) => self.handle_sysex(msg),
        };
        trace!(kind = message.label(), ?outcome, "dispatched");
        outcome
    }

    fn handle_channel(&mut self, msg: &ChannelMessage) -> Dispatched {
        match msg.class() {
            ChannelClass::DigitalUpdate => {
                let port = msg.channel();
                let mask = msg.value14();
                self.state.set_digital_port(port, mask);
                Dispatched::DigitalPort { port, mask }
            }
            ChannelClass::AnalogUpdate => {
                let channel = msg.channel();
                let value = seven_bit::to_signed14(msg.value14());
                self.state.analog_channel[usize::from(channel)] = value;
                self.listeners.notify_update();
                Dispatched::Analog { channel, value }
            }
            ChannelClass::ProtocolVersion => {
                let version = format!("Firmata Protocol {}.{}", msg.arg1, msg.arg2);
                self.state.firmata_version = version.clone();
                Dispatched::ProtocolVersion { version }
            }
            _ => Dispatched::Ignored,
        }
    }

    fn handle_sysex(&mut self, msg: &SysexMessage) -> Dispatched {
        let payload = &msg.payload[..];
        match msg.subcommand {
            REPORT_EVENT => {
                let (Some(source), Some(event)) = (payload.get(0..3), payload.get(3..6)) else {
                    debug!(len = payload.len(), "short event report ignored");
                    return Dispatched::Ignored;
                };
                let source_id = seven_bit::join21([source[0], source[1], source[2]]);
                let event_id = seven_bit::join21([event[0], event[1], event[2]]);
                self.listeners.notify_event(source_id, event_id);
                Dispatched::Event {
                    source_id,
                    event_id,
                }
            }
            DEBUG_STRING => {
                let text = seven_bit::unpack_ascii7(payload);
                debug!(target: "mbfirmata::board", text = %text, "board debug");
                Dispatched::DebugString { text }
            }
            REPORT_FIRMWARE => {
                let [major, minor, name @ ..] = payload else {
                    return Dispatched::Ignored;
                };
                let version = format!("{} {}.{}", seven_bit::unpack_text(name), major, minor);
                self.state.firmware_version = version.clone();
                Dispatched::Firmware { version }
            }
            CAPABILITY_RESPONSE => {
                self.state.set_capabilities(payload);
                Dispatched::Capabilities {
                    pins: self.state.pin_capabilities.len(),
                }
            }
            ANALOG_MAPPING_RESPONSE => {
                self.state.set_analog_mapping(payload);
                Dispatched::AnalogMapping {
                    entries: self.state.analog_mapping.len(),
                }
            }
            PIN_STATE_RESPONSE => {
                let [pin, mode, groups @ ..] = payload else {
                    return Dispatched::Ignored;
                };
                let state = groups
                    .iter()
                    .take(5)
                    .enumerate()
                    .fold(0u32, |acc, (i, &b)| acc | (u32::from(b & 0x7F) << (7 * i)));
                self.state.pin_states.insert(
                    *pin,
                    PinState {
                        mode: *mode,
                        state,
                    },
                );
                Dispatched::PinState {
                    pin: *pin,
                    mode: *mode,
                    state,
                }
            }
            _ => Dispatched::Ignored,
        }
    }
}
