//! In-memory representation of a classic CAN data frame.
use embedded_can::{ExtendedId, Frame, Id};

use crate::config::MAX_EXTENDED_ID;
use crate::infra::codec::payload::Payload;
use crate::protocol::transport::can_id::CanId;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw CAN frame as exchanged with the controller.
pub struct CanFrame {
    /// 11- or 29-bit identifier.
    pub id: CanId,
    /// Payload buffer. Bytes past `len` are zero.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from a two-word payload; `len` is clamped to 8.
    pub fn from_payload(id: CanId, payload: &Payload, len: usize) -> Self {
        Self {
            id,
            data: payload.to_bytes(),
            len: len.min(8),
        }
    }

    /// Payload as two little-endian words.
    pub fn payload(&self) -> Payload {
        Payload::from_bytes(&self.data)
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buffer = [0u8; 8];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id: CanId::from(id.into()),
            data: buffer,
            len: data.len(),
        })
    }

    /// Remote frames are never produced nor consumed by this crate.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.id.is_extended()
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id.to_embedded().unwrap_or_else(|| {
            Id::Extended(ExtendedId::new(self.id.0 & MAX_EXTENDED_ID).unwrap_or(ExtendedId::MAX))
        })
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
