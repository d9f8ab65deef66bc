//! Value types shared by the mapping tables, the field codec, the SDO handler
//! and the persistence layer.

//==================================================================================PARAM_ID
/// Runtime (enumerated) index of a parameter in the parameter store.
///
/// This index is only meaningful for the firmware build that produced it. The
/// persisted configuration uses the store's stable unique id instead, see
/// [`ParamStore::unique_id`](crate::protocol::transport::traits::param_store::ParamStore::unique_id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamId(pub u16);

impl ParamId {
    /// Raw enumerated index.
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl From<u16> for ParamId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

//==================================================================================FIXED
/// Signed fixed-point number as exchanged with the parameter store.
///
/// Stored as a raw `i32` with [`Fixed::FRAC_BITS`] fractional bits. The raw
/// representation is what travels in SDO read/write frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed(i32);

impl Fixed {
    /// Number of fractional bits.
    pub const FRAC_BITS: u32 = 5;
    /// Raw value of `1.0`.
    pub const ONE: i32 = 1 << Self::FRAC_BITS;
    pub const ZERO: Fixed = Fixed(0);

    /// Wrap a raw fixed-point representation.
    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Raw fixed-point representation.
    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Convert an integer into fixed-point (saturating on overflow).
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value.saturating_mul(Self::ONE))
    }

    /// Integer part, truncated toward zero.
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 / Self::ONE
    }

    /// Nearest representable value (float casts saturate).
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        let scaled = value * Self::ONE as f32;
        // `as` truncates toward zero; round half away from zero first.
        let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
        Self(rounded as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::ONE as f32
    }
}

//==================================================================================DIRECTION
/// Which of the two message tables a mapping belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Outbound: parameter values are encoded and sent by `send_all`.
    Send,
    /// Inbound: received frames are decoded into the parameter store.
    Receive,
}

impl Direction {
    /// `true` for inbound mappings.
    #[inline]
    pub fn is_rx(self) -> bool {
        matches!(self, Direction::Receive)
    }
}
