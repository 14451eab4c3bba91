//! 7-bit packing of numeric and text payloads.
//!
//! The framer finds command boundaries by looking for bytes with the high bit
//! set, so every value carried inside a message is split into 7-bit groups,
//! least-significant group first.

/// Largest value that fits in two 7-bit groups.
pub const MAX_14: u16 = 0x3FFF;
/// Largest value that fits in three 7-bit groups.
pub const MAX_21: u32 = 0x1F_FFFF;

const LOW7: u8 = 0x7F;

/// Split a 14-bit value into `[low7, high7]`. Bits above 14 are discarded.
pub fn split14(value: u16) -> [u8; 2] {
    [(value as u8) & LOW7, ((value >> 7) as u8) & LOW7]
}

/// Join `low7 | high7 << 7`.
pub fn join14(low: u8, high: u8) -> u16 {
    u16::from(low & LOW7) | (u16::from(high & LOW7) << 7)
}

/// Reinterpret a raw 14-bit value as two's-complement.
///
/// Values above 8191 are negative: `raw - 16384`.
pub fn to_signed14(raw: u16) -> i16 {
    let raw = raw & MAX_14;
    if raw > 0x1FFF {
        raw as i16 - 0x4000
    } else {
        raw as i16
    }
}

/// Raw 14-bit pattern of a signed value in `[-8192, 8191]`.
pub fn from_signed14(value: i16) -> u16 {
    (value as u16) & MAX_14
}

/// Split a 21-bit value into three 7-bit groups, little-endian.
pub fn split21(value: u32) -> [u8; 3] {
    [
        (value as u8) & LOW7,
        ((value >> 7) as u8) & LOW7,
        ((value >> 14) as u8) & LOW7,
    ]
}

/// Join three little-endian 7-bit groups: `b0 | b1 << 7 | b2 << 14`.
pub fn join21(bytes: [u8; 3]) -> u32 {
    u32::from(bytes[0] & LOW7)
        | (u32::from(bytes[1] & LOW7) << 7)
        | (u32::from(bytes[2] & LOW7) << 14)
}

/// Split a 32-bit signed value into five 7-bit groups, least significant first.
///
/// The fifth group carries only the top four bits of the two's-complement pattern.
pub fn split32(value: i32) -> [u8; 5] {
    let bits = value as u32;
    [
        (bits as u8) & LOW7,
        ((bits >> 7) as u8) & LOW7,
        ((bits >> 14) as u8) & LOW7,
        ((bits >> 21) as u8) & LOW7,
        ((bits >> 28) as u8) & LOW7,
    ]
}

/// Join five 7-bit groups back into the original 32-bit signed value.
pub fn join32(bytes: [u8; 5]) -> i32 {
    let bits = u32::from(bytes[0] & LOW7)
        | (u32::from(bytes[1] & LOW7) << 7)
        | (u32::from(bytes[2] & LOW7) << 14)
        | (u32::from(bytes[3] & LOW7) << 21)
        | (u32::from(bytes[4] & LOW7) << 28);
    bits as i32
}

/// Pack text as pairs of 7-bit groups, one pair per UTF-8 byte.
///
/// At most `max_bytes` UTF-8 bytes are taken, so the output never exceeds
/// `2 * max_bytes`. Longer text is truncated on a character boundary.
pub fn pack_text(text: &str, max_bytes: usize) -> Vec<u8> {
    let mut end = text.len().min(max_bytes);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = Vec::with_capacity(end * 2);
    for &byte in &text.as_bytes()[..end] {
        out.push(byte & LOW7);
        out.push(byte >> 7);
    }
    out
}

/// Unpack pairs produced by [`pack_text`].
///
/// Each pair is `low7 | high7 << 7`, but only byte values are carried, so
/// just bit 0 of `high7` is kept; anything above it is dropped. A trailing
/// unpaired byte is ignored; invalid UTF-8 is replaced.
pub fn unpack_text(payload: &[u8]) -> String {
    let bytes: Vec<u8> = payload
        .chunks_exact(2)
        .map(|pair| (pair[0] & LOW7) | ((pair[1] & 0x01) << 7))
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decode text sent as one 7-bit ASCII character per byte.
pub fn unpack_ascii7(payload: &[u8]) -> String {
    payload.iter().map(|&b| char::from(b & LOW7)).collect()
}

/// True when every byte is a valid data byte (high bit clear).
pub fn is_seven_bit(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b & 0x80 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed14_covers_full_range() {
        for value in -8192i16..=8191 {
            let [low, high] = split14(from_signed14(value));
            assert!(is_seven_bit(&[low, high]));
            assert_eq!(to_signed14(join14(low, high)), value);
        }
    }

    #[test]
    fn signed14_boundaries() {
        assert_eq!(to_signed14(8191), 8191);
        assert_eq!(to_signed14(8192), -8192);
        assert_eq!(to_signed14(8193), -8191);
        assert_eq!(to_signed14(16383), -1);
        assert_eq!(to_signed14(0), 0);
    }

    #[test]
    fn split14_little_endian() {
        assert_eq!(split14(100), [100, 0]);
        assert_eq!(split14(1000), [0x68, 0x07]);
        assert_eq!(join14(0x68, 0x07), 1000);
        assert_eq!(split14(MAX_14), [0x7F, 0x7F]);
    }

    #[test]
    fn join21_orders_groups() {
        assert_eq!(join21([1, 0, 0]), 1);
        assert_eq!(join21([0, 1, 0]), 128);
        assert_eq!(join21([0, 0, 1]), 16384);
        assert_eq!(join21([0x7F, 0x7F, 0x7F]), MAX_21);
        assert_eq!(split21(1234567), [0x07, 0x2D, 0x4B]);
        assert_eq!(join21(split21(1234567)), 1234567);
    }

    #[test]
    fn split32_boundaries() {
        for value in [0, -1, 1, i32::MAX, i32::MIN, 42, -123_456_789] {
            let groups = split32(value);
            assert!(is_seven_bit(&groups));
            assert_eq!(join32(groups), value);
        }
        assert_eq!(split32(0), [0, 0, 0, 0, 0]);
        assert_eq!(split32(-1), [0x7F, 0x7F, 0x7F, 0x7F, 0x0F]);
        assert_eq!(split32(i32::MIN), [0, 0, 0, 0, 0x08]);
        assert_eq!(split32(i32::MAX), [0x7F, 0x7F, 0x7F, 0x7F, 0x07]);
    }

    #[test]
    fn text_pairs_are_low_then_high() {
        assert_eq!(pack_text("Hi", 100), vec![b'H', 0, b'i', 0]);
        // U+00E9 is 0xC3 0xA9 in UTF-8.
        assert_eq!(pack_text("é", 100), vec![0x43, 1, 0x29, 1]);
        assert_eq!(unpack_text(&pack_text("héllo", 100)), "héllo");
    }

    #[test]
    fn text_truncates_on_char_boundary() {
        let long = "x".repeat(150);
        assert_eq!(pack_text(&long, 100).len(), 200);
        assert_eq!(unpack_text(&pack_text("aé", 1)), "a");
        assert_eq!(unpack_text(&pack_text("aé", 2)), "a");
        assert_eq!(unpack_text(&pack_text("aé", 3)), "aé");
        assert!(pack_text("", 100).is_empty());
    }

    #[test]
    fn text_limit_counts_utf8_bytes() {
        // Two bytes per character: 100 bytes hold 50 of them.
        let packed = pack_text(&"é".repeat(100), 100);
        assert_eq!(packed.len(), 200);
        assert_eq!(unpack_text(&packed), "é".repeat(50));

        // Three-byte characters cannot be split; 33 fit in 100 bytes.
        let packed = pack_text(&"€".repeat(40), 100);
        assert_eq!(packed.len(), 2 * 99);
        assert_eq!(unpack_text(&packed), "€".repeat(33));
    }

    #[test]
    fn unpack_keeps_only_low_bit_of_high_group() {
        // high7 = 0x03 would make 0x1C3; only 0xC3 survives.
        assert_eq!(
            unpack_text(&[0x43, 0x03, 0x29, 0x01]),
            unpack_text(&[0x43, 0x01, 0x29, 0x01])
        );
        assert_eq!(unpack_text(&[b'A', 0x02]), "A");
    }

    #[test]
    fn unpack_ignores_trailing_byte() {
        assert_eq!(unpack_text(&[b'o', 0, b'k', 0, 0x11]), "ok");
    }

    #[test]
    fn ascii7_debug_text() {
        assert_eq!(unpack_ascii7(b"systemReset"), "systemReset");
    }
}
