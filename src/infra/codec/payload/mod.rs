//! Eight-byte CAN payload modelled as two little-endian 32-bit words, with the
//! bit-field insert/extract primitives used by the field codec.
//!
//! Bit `n` of the payload is bit `n % 32` of word `n / 32`. A field is placed
//! in the word selected by its offset: offsets 0..=31 address the low word,
//! offsets 32..=63 the high word (shifted by `offset - 32`). Bits of a field
//! that would cross the end of its word are discarded.

//==================================================================================PAYLOAD
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Payload(pub [u32; 2]);

impl Payload {
    pub const EMPTY: Payload = Payload([0, 0]);

    /// Build from the raw frame bytes (byte 0 is the least significant byte
    /// of the low word).
    pub fn from_bytes(bytes: &[u8; 8]) -> Self {
        Self([
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        ])
    }

    /// Raw frame bytes.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.0[0].to_le_bytes());
        out[4..].copy_from_slice(&self.0[1].to_le_bytes());
        out
    }

    /// Whole payload as a single `u64` (low word first).
    #[inline]
    pub fn as_u64(&self) -> u64 {
        (self.0[0] as u64) | ((self.0[1] as u64) << 32)
    }

    /// OR `value` (masked to `width` bits) into the payload at `offset`.
    ///
    /// Existing bits are not cleared: the payload is expected to start empty
    /// and each field to own its bit range.
    pub fn insert_bits(&mut self, offset: u8, width: u8, value: u32) {
        let (word, shift) = Self::locate(offset);
        let masked = value & field_mask(width);
        self.0[word] |= masked.checked_shl(shift).unwrap_or(0);
    }

    /// Read `width` bits at `offset` as an unsigned integer.
    pub fn extract_bits(&self, offset: u8, width: u8) -> u32 {
        let (word, shift) = Self::locate(offset);
        self.0[word].checked_shr(shift).unwrap_or(0) & field_mask(width)
    }

    /// Word index and in-word shift for a bit offset (clamped to 63).
    #[inline]
    fn locate(offset: u8) -> (usize, u32) {
        let offset = offset.min(63) as u32;
        if offset > 31 {
            (1, offset - 32)
        } else {
            (0, offset)
        }
    }
}

/// Mask covering the `width` least significant bits (`width` clamped to 32).
#[inline]
pub fn field_mask(width: u8) -> u32 {
    match width {
        0 => 0,
        w if w >= 32 => u32::MAX,
        w => (1u32 << w) - 1,
    }
}
