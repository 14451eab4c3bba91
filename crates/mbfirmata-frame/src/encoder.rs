//! Outbound command builders.
//!
//! Every builder validates its arguments and returns `None` for input the
//! board cannot accept, so callers can forward the result without checking
//! ranges themselves. All argument bytes are 7-bit clean.

use bytes::{BufMut, Bytes, BytesMut};

use crate::seven_bit;
use crate::wire::{
    PinMode, ANALOG_MAPPING_QUERY, CAPABILITY_QUERY, DIGITAL_UPDATE, DISPLAY_CLEAR,
    DISPLAY_PLOT, DISPLAY_SHOW, EXTENDED_ANALOG, MAX_CHANNEL, PIN_COUNT, PIN_STATE_QUERY,
    PROTOCOL_VERSION, REPORT_FIRMWARE, SAMPLING_INTERVAL, SCROLL_INTEGER, SCROLL_STRING,
    SET_DIGITAL_PIN, SET_PIN_MODE, SET_TOUCH_MODE, STREAM_ANALOG, STREAM_DIGITAL, SYSEX_END,
    SYSEX_START, SYSTEM_RESET,
};

/// Default scroll delay in milliseconds per column.
pub const DEFAULT_SCROLL_DELAY: u8 = 120;
/// Longest text the board will scroll, in UTF-8 bytes.
pub const MAX_SCROLL_BYTES: usize = 100;
/// Width and height of the LED matrix.
pub const DISPLAY_SIZE: usize = 5;
/// Pins 0-2 are the only ones with touch sensing.
pub const TOUCH_PIN_COUNT: u8 = 3;
/// Valid sampling interval range in milliseconds.
pub const SAMPLING_INTERVAL_RANGE: std::ops::RangeInclusive<u16> = 1..=seven_bit::MAX_14;

fn sysex(subcommand: u8, payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(payload.len() + 3);
    dst.put_u8(SYSEX_START);
    dst.put_u8(subcommand);
    dst.put_slice(payload);
    dst.put_u8(SYSEX_END);
    dst.freeze()
}

fn valid_pin(pin: u8) -> bool {
    usize::from(pin) < PIN_COUNT
}

/// Halve brightness above 1 so it fits in 7 bits.
///
/// 0 and 1 pass through unchanged; 2-255 map to 1-127. The board scales back
/// up, so odd levels lose their lowest bit.
pub fn scale_brightness(level: u8) -> u8 {
    if level > 1 {
        level / 2
    } else {
        level
    }
}

/// `[0xF4, pin, mode]` for pins 0-20.
pub fn set_pin_mode(pin: u8, mode: PinMode) -> Option<Bytes> {
    if !valid_pin(pin) {
        return None;
    }
    Some(Bytes::copy_from_slice(&[SET_PIN_MODE, pin, mode.as_byte()]))
}

/// `[0xF5, pin, 0|1]` for pins 0-20.
pub fn set_digital_pin(pin: u8, high: bool) -> Option<Bytes> {
    if !valid_pin(pin) {
        return None;
    }
    Some(Bytes::copy_from_slice(&[
        SET_DIGITAL_PIN,
        pin,
        u8::from(high),
    ]))
}

/// Write all eight pins of a port at once. Only ports 0-2 hold pins.
pub fn write_digital_port(port: u8, mask: u8) -> Option<Bytes> {
    if usize::from(port) * 8 >= PIN_COUNT {
        return None;
    }
    let [low, high] = seven_bit::split14(u16::from(mask));
    Some(Bytes::copy_from_slice(&[DIGITAL_UPDATE | port, low, high]))
}

/// Turn change reports for a digital port on or off.
pub fn stream_digital_port(port: u8, on: bool) -> Option<Bytes> {
    if port > MAX_CHANNEL {
        return None;
    }
    Some(Bytes::copy_from_slice(&[STREAM_DIGITAL | port, u8::from(on)]))
}

/// Turn periodic reports for an analog channel on or off.
pub fn stream_analog_channel(channel: u8, on: bool) -> Option<Bytes> {
    if channel > MAX_CHANNEL {
        return None;
    }
    Some(Bytes::copy_from_slice(&[STREAM_ANALOG | channel, u8::from(on)]))
}

/// Set the analog sampling period, 1-16383 ms.
pub fn set_sampling_interval(millis: u16) -> Option<Bytes> {
    if !SAMPLING_INTERVAL_RANGE.contains(&millis) {
        return None;
    }
    Some(sysex(SAMPLING_INTERVAL, &seven_bit::split14(millis)))
}

/// PWM / extended analog write of a 14-bit value to a pin.
pub fn analog_write(pin: u8, value: u16) -> Option<Bytes> {
    if !valid_pin(pin) || value > seven_bit::MAX_14 {
        return None;
    }
    let [low, high] = seven_bit::split14(value);
    Some(sysex(EXTENDED_ANALOG, &[pin, low, high]))
}

/// Enable or disable touch sensing on pins 0-2.
pub fn set_touch_mode(pin: u8, on: bool) -> Option<Bytes> {
    if pin >= TOUCH_PIN_COUNT {
        return None;
    }
    Some(sysex(SET_TOUCH_MODE, &[pin, u8::from(on)]))
}

pub fn display_clear() -> Bytes {
    sysex(DISPLAY_CLEAR, &[])
}

/// Show a full 5x5 image. Rows are top to bottom, columns left to right.
pub fn display_show(grayscale: bool, image: &[[u8; DISPLAY_SIZE]; DISPLAY_SIZE]) -> Bytes {
    let mut payload = Vec::with_capacity(1 + DISPLAY_SIZE * DISPLAY_SIZE);
    payload.push(u8::from(grayscale));
    for row in image {
        payload.extend(row.iter().map(|&level| scale_brightness(level)));
    }
    sysex(DISPLAY_SHOW, &payload)
}

/// Set one LED. Coordinates outside the 5x5 matrix are rejected.
pub fn display_plot(x: u8, y: u8, brightness: u8) -> Option<Bytes> {
    if usize::from(x) >= DISPLAY_SIZE || usize::from(y) >= DISPLAY_SIZE {
        return None;
    }
    Some(sysex(DISPLAY_PLOT, &[x, y, scale_brightness(brightness)]))
}

/// Scroll text across the display; text beyond 100 UTF-8 bytes is cut on a
/// character boundary, so the command is at most 204 bytes.
///
/// `delay` must fit in a data byte (0-127).
pub fn scroll_string(text: &str, delay: u8) -> Option<Bytes> {
    if delay > 0x7F {
        return None;
    }
    let mut payload = vec![delay];
    payload.extend(seven_bit::pack_text(text, MAX_SCROLL_BYTES));
    Some(sysex(SCROLL_STRING, &payload))
}

/// Scroll a signed integer across the display.
pub fn scroll_integer(n: i32, delay: u8) -> Option<Bytes> {
    if delay > 0x7F {
        return None;
    }
    let mut payload = vec![delay];
    payload.extend_from_slice(&seven_bit::split32(n));
    Some(sysex(SCROLL_INTEGER, &payload))
}

/// Ask for the protocol version. The board answers with `[0xF9, major, minor]`.
pub fn request_protocol_version() -> Bytes {
    Bytes::from_static(&[PROTOCOL_VERSION])
}

/// Ask for the firmware name and version.
pub fn request_firmware() -> Bytes {
    sysex(REPORT_FIRMWARE, &[])
}

pub fn system_reset() -> Bytes {
    Bytes::from_static(&[SYSTEM_RESET])
}

pub fn query_capabilities() -> Bytes {
    sysex(CAPABILITY_QUERY, &[])
}

pub fn query_analog_mapping() -> Bytes {
    sysex(ANALOG_MAPPING_QUERY, &[])
}

pub fn query_pin_state(pin: u8) -> Option<Bytes> {
    if !valid_pin(pin) {
        return None;
    }
    Some(sysex(PIN_STATE_QUERY, &[pin]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framer::StreamFramer;
    use crate::message::{Message, SysexMessage};

    fn assert_clean(bytes: &[u8]) {
        assert!(
            seven_bit::is_seven_bit(&bytes[1..bytes.len() - 1]),
            "non 7-bit data byte in {bytes:02X?}"
        );
    }

    #[test]
    fn pin_mode_range() {
        assert_eq!(
            set_pin_mode(20, PinMode::PullDownInput).unwrap().as_ref(),
            &[0xF4, 20, 0x0F]
        );
        assert!(set_pin_mode(21, PinMode::DigitalOutput).is_none());
    }

    #[test]
    fn digital_pin_and_port() {
        assert_eq!(set_digital_pin(3, true).unwrap().as_ref(), &[0xF5, 3, 1]);
        assert!(set_digital_pin(21, false).is_none());
        assert_eq!(
            write_digital_port(1, 0b1000_0001).unwrap().as_ref(),
            &[0x91, 0x01, 0x01]
        );
        assert!(write_digital_port(2, 0).is_some());
        assert!(write_digital_port(3, 0).is_none());
    }

    #[test]
    fn streaming_toggles() {
        assert_eq!(stream_digital_port(2, true).unwrap().as_ref(), &[0xD2, 1]);
        assert_eq!(stream_analog_channel(15, false).unwrap().as_ref(), &[0xCF, 0]);
        assert!(stream_analog_channel(16, true).is_none());
        assert!(stream_digital_port(16, true).is_none());
    }

    #[test]
    fn sampling_interval_range() {
        assert_eq!(
            set_sampling_interval(1000).unwrap().as_ref(),
            &[0xF0, 0x7A, 0x68, 0x07, 0xF7]
        );
        assert!(set_sampling_interval(1).is_some());
        assert!(set_sampling_interval(16383).is_some());
        assert!(set_sampling_interval(0).is_none());
        assert!(set_sampling_interval(16384).is_none());
    }

    #[test]
    fn touch_mode_pins() {
        assert_eq!(
            set_touch_mode(2, true).unwrap().as_ref(),
            &[0xF0, 0x06, 2, 1, 0xF7]
        );
        assert!(set_touch_mode(3, true).is_none());
    }

    #[test]
    fn analog_write_packs_value() {
        assert_eq!(
            analog_write(0, 1023).unwrap().as_ref(),
            &[0xF0, 0x6F, 0, 0x7F, 0x07, 0xF7]
        );
        assert!(analog_write(0, 16384).is_none());
        assert!(analog_write(21, 1).is_none());
    }

    #[test]
    fn display_brightness_is_halved_above_one() {
        let mut image = [[0u8; 5]; 5];
        image[0] = [0, 1, 2, 254, 255];
        image[4][4] = 9;
        let bytes = display_show(true, &image);
        assert_eq!(bytes.len(), 2 + 1 + 25 + 1);
        assert_eq!(&bytes[..8], &[0xF0, 0x02, 1, 0, 1, 1, 127, 127]);
        assert_eq!(bytes[bytes.len() - 2], 4);
        assert_clean(&bytes);

        let bw = display_show(false, &[[1u8; 5]; 5]);
        assert_eq!(bw[2], 0);
        assert!(bw[3..28].iter().all(|&b| b == 1));
    }

    #[test]
    fn display_plot_bounds() {
        assert_eq!(
            display_plot(4, 0, 200).unwrap().as_ref(),
            &[0xF0, 0x03, 4, 0, 100, 0xF7]
        );
        assert!(display_plot(5, 0, 1).is_none());
        assert!(display_plot(0, 5, 1).is_none());
        assert_eq!(display_clear().as_ref(), &[0xF0, 0x01, 0xF7]);
    }

    #[test]
    fn scroll_string_truncates() {
        let bytes = scroll_string("Hi", DEFAULT_SCROLL_DELAY).unwrap();
        assert_eq!(bytes.as_ref(), &[0xF0, 0x04, 120, b'H', 0, b'i', 0, 0xF7]);

        let long = "a".repeat(150);
        let bytes = scroll_string(&long, 50).unwrap();
        assert_eq!(bytes.len(), 3 + 1 + 200);
        assert_clean(&bytes);
        assert!(scroll_string("x", 128).is_none());
    }

    #[test]
    fn scroll_string_limits_utf8_bytes() {
        let bytes = scroll_string(&"é".repeat(100), DEFAULT_SCROLL_DELAY).unwrap();
        assert_eq!(bytes.len(), 3 + 1 + 2 * MAX_SCROLL_BYTES);
        assert_clean(&bytes);

        // The whole command fits the default input buffer and frames intact.
        let mut framer = StreamFramer::new();
        let messages = framer.feed(&bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(framer.stats().dropped_bytes, 0);
        match &messages[0] {
            Message::Sysex(msg) => {
                assert_eq!(msg.subcommand, SCROLL_STRING);
                assert_eq!(seven_bit::unpack_text(&msg.payload[1..]), "é".repeat(50));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn scroll_integer_survives_framing() {
        for n in [0, -1, i32::MAX, i32::MIN] {
            let bytes = scroll_integer(n, DEFAULT_SCROLL_DELAY).unwrap();
            assert_clean(&bytes);

            let messages = StreamFramer::new().feed(&bytes);
            let Message::Sysex(SysexMessage {
                subcommand,
                payload,
            }) = &messages[0]
            else {
                panic!("expected sysex, got {messages:?}");
            };
            assert_eq!(*subcommand, SCROLL_INTEGER);
            assert_eq!(payload[0], DEFAULT_SCROLL_DELAY);
            let groups: [u8; 5] = payload[1..6].try_into().unwrap();
            assert_eq!(seven_bit::join32(groups), n);
        }
    }

    #[test]
    fn fixed_queries() {
        assert_eq!(request_protocol_version().as_ref(), &[0xF9]);
        assert_eq!(request_firmware().as_ref(), &[0xF0, 0x79, 0xF7]);
        assert_eq!(system_reset().as_ref(), &[0xFF]);
        assert_eq!(query_capabilities().as_ref(), &[0xF0, 0x6B, 0xF7]);
        assert_eq!(query_analog_mapping().as_ref(), &[0xF0, 0x69, 0xF7]);
        assert_eq!(query_pin_state(5).unwrap().as_ref(), &[0xF0, 0x6D, 5, 0xF7]);
        assert!(query_pin_state(21).is_none());
    }
}
