//! Raw CAN identifiers as stored in the message tables, with the
//! standard/extended classification used when frames hit the wire.
use embedded_can::{ExtendedId, Id, StandardId};

use crate::config::{MAX_EXTENDED_ID, MAX_STANDARD_ID};
use crate::error::MapError;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// An 11-bit or 29-bit CAN identifier stored inside a `u32`.
///
/// The frame format is inferred from the value: anything above `0x7FF` is an
/// extended identifier.
pub struct CanId(pub u32);

impl CanId {
    /// Validates that `raw` fits in 29 bits.
    pub fn new(raw: u32) -> Result<Self, MapError> {
        if raw > MAX_EXTENDED_ID {
            return Err(MapError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Raw numeric value.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Whether the identifier must be sent in the 29-bit format.
    #[inline]
    pub fn is_extended(&self) -> bool {
        self.0 > MAX_STANDARD_ID
    }

    /// Converts to the `embedded-can` representation.
    pub fn to_embedded(&self) -> Option<Id> {
        if self.is_extended() {
            ExtendedId::new(self.0).map(Id::Extended)
        } else {
            StandardId::new(self.0 as u16).map(Id::Standard)
        }
    }
}

impl From<Id> for CanId {
    fn from(id: Id) -> Self {
        match id {
            Id::Standard(id) => CanId(id.as_raw() as u32),
            Id::Extended(id) => CanId(id.as_raw()),
        }
    }
}

impl From<StandardId> for CanId {
    fn from(id: StandardId) -> Self {
        CanId(id.as_raw() as u32)
    }
}

impl From<ExtendedId> for CanId {
    fn from(id: ExtendedId) -> Self {
        CanId(id.as_raw())
    }
}
