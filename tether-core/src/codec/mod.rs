//! Hex codec and frame primitives for the remote serial protocol.
//!
//! Every message on the wire is `'$' payload '#' cc`, where `cc` is the 8-bit
//! sum of the payload characters as transmitted, written as two lowercase hex
//! digits. Binary data travels as hex pairs, most significant nibble first.

pub mod frame;

pub use frame::{Link, PacketWriter};

/// Start-of-frame delimiter.
pub const FRAME_START: u8 = b'$';
/// End-of-payload delimiter; two checksum characters follow it.
pub const FRAME_END: u8 = b'#';
/// Positive acknowledge sent once an inbound frame has been consumed.
pub const ACK: u8 = b'+';

/// Hex digit for the low nibble of `n`. Values above 15 map to `'0'`.
pub const fn hex_digit(n: u8) -> u8 {
    match n {
        0..=9 => b'0' + n,
        10..=15 => b'a' + n - 10,
        _ => b'0',
    }
}

/// Value of a single hex character. Anything that is not a hex digit decodes to 0.
pub const fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Encode one byte as two lowercase hex characters.
pub const fn encode_byte(v: u8) -> [u8; 2] {
    [hex_digit(v >> 4), hex_digit(v & 0x0f)]
}

/// Decode two hex characters (either case) into a byte.
pub const fn decode_byte(pair: [u8; 2]) -> u8 {
    (hex_value(pair[0]) << 4) | hex_value(pair[1])
}

/// Reverse the byte order of a 32-bit word.
///
/// Register values in `P` packets arrive in target byte order but are
/// accumulated most-significant digit first.
pub const fn swap_byte_order(word: u32) -> u32 {
    word.swap_bytes()
}

/// Running modulo-256 sum of transmitted characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn push(&mut self, c: u8) {
        self.0 = self.0.wrapping_add(c);
    }

    pub fn extend(&mut self, chars: &[u8]) {
        for &c in chars {
            self.push(c);
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Checksum of a payload as it appears on the wire.
pub fn checksum(payload: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.extend(payload);
    sum.value()
}
