//! Expedited SDO subset used for remote configuration.
//!
//! Requests arrive on `request base + node id` as 8-byte frames laid out as
//! `{command: u8, index: u16 LE, sub_index: u8, data: u32 LE}`. Supported
//! objects:
//!
//! * `0x2000` / sub `n`: parameter with enumerated index `n` (read/write).
//! * `0x2001` / sub `n`: parameter with unique id `n` (read/write).
//! * `0x3000..0x4800` / sub `n`: write-only mapping of parameter `n`. The CAN
//!   id is `index & 0x7FF`; bit `0x4000` selects the inbound table. The data
//!   word carries the bit offset (bits 0..8), the width (bits 8..16) and an
//!   integer gain (bits 16..32).
//!
//! Everything else is answered with an abort carrying
//! [`SdoAbortCode::InvalidIndex`].
use crate::core::{Direction, Fixed, ParamId};
use crate::error::{MapError, SdoAbortCode};
use crate::infra::codec::payload::Payload;
use crate::protocol::transport::traits::param_store::ParamStore;

pub const SDO_WRITE: u8 = 0x40;
pub const SDO_READ: u8 = 0x22;
pub const SDO_ABORT: u8 = 0x80;
pub const SDO_WRITE_REPLY: u8 = 0x23;
pub const SDO_READ_REPLY: u8 = 0x43;

/// Parameter by enumerated index.
pub const INDEX_PARAM: u16 = 0x2000;
/// Parameter by unique id.
pub const INDEX_PARAM_BY_UID: u16 = 0x2001;
/// First mapping object.
pub const INDEX_MAP_START: u16 = 0x3000;
/// One past the last mapping object.
pub const INDEX_MAP_END: u16 = 0x4800;
/// Mapping objects with this bit set target the inbound table.
pub const INDEX_MAP_RX_FLAG: u16 = 0x4000;
/// Mapping objects carry the CAN id in these bits.
pub const INDEX_MAP_ID_MASK: u16 = 0x7FF;

//==================================================================================SDO_FRAME
/// Decoded SDO request or reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdoFrame {
    pub command: u8,
    pub index: u16,
    pub sub_index: u8,
    pub data: u32,
}

impl SdoFrame {
    /// Write request for a remote node.
    pub const fn write_request(index: u16, sub_index: u8, data: u32) -> Self {
        Self {
            command: SDO_WRITE,
            index,
            sub_index,
            data,
        }
    }

    /// Read request for a remote node.
    pub const fn read_request(index: u16, sub_index: u8) -> Self {
        Self {
            command: SDO_READ,
            index,
            sub_index,
            data: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8; 8]) -> Self {
        Self {
            command: bytes[0],
            index: u16::from_le_bytes([bytes[1], bytes[2]]),
            sub_index: bytes[3],
            data: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let index = self.index.to_le_bytes();
        let data = self.data.to_le_bytes();
        [
            self.command,
            index[0],
            index[1],
            self.sub_index,
            data[0],
            data[1],
            data[2],
            data[3],
        ]
    }

    pub fn from_payload(payload: &Payload) -> Self {
        Self::from_bytes(&payload.to_bytes())
    }

    pub fn to_payload(&self) -> Payload {
        Payload::from_bytes(&self.to_bytes())
    }

    /// Same object, turned into an abort reply.
    pub fn abort(self, code: SdoAbortCode) -> Self {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "SDO abort {:#x} for {:#x}/{}",
            code.as_u32(),
            self.index,
            self.sub_index
        );
        Self {
            command: SDO_ABORT,
            data: code.as_u32(),
            ..self
        }
    }

    /// Abort code carried by an abort reply.
    pub fn abort_code(&self) -> Option<u32> {
        (self.command == SDO_ABORT).then_some(self.data)
    }
}

//==================================================================================MAP_REQUEST
/// Mapping carried by a write to a mapping object.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MapRequest {
    pub direction: Direction,
    pub param: ParamId,
    pub id: u32,
    pub offset_bits: u8,
    pub width_bits: u8,
    pub gain: f32,
}

impl MapRequest {
    fn decode(request: &SdoFrame) -> Self {
        let direction = if request.index & INDEX_MAP_RX_FLAG == INDEX_MAP_RX_FLAG {
            Direction::Receive
        } else {
            Direction::Send
        };
        Self {
            direction,
            param: ParamId(request.sub_index as u16),
            id: (request.index & INDEX_MAP_ID_MASK) as u32,
            offset_bits: request.data as u8,
            width_bits: (request.data >> 8) as u8,
            gain: (request.data >> 16) as f32,
        }
    }
}

//==================================================================================HANDLER
/// Execute `request` and build the reply.
///
/// `add_mapping` performs mapping writes; the caller decides how the map is
/// updated (and which filters are reprogrammed as a consequence).
pub fn process<P, F>(request: SdoFrame, params: &P, add_mapping: F) -> SdoFrame
where
    P: ParamStore + ?Sized,
    F: FnOnce(MapRequest) -> Result<usize, MapError>,
{
    let in_range = (request.sub_index as u16) < params.count();

    match request.index {
        INDEX_PARAM | INDEX_PARAM_BY_UID if in_range => {
            let param = if request.index == INDEX_PARAM_BY_UID {
                match params.from_unique_id(request.sub_index as u16) {
                    Some(param) => param,
                    None => return request.abort(SdoAbortCode::InvalidIndex),
                }
            } else {
                ParamId(request.sub_index as u16)
            };

            match request.command {
                SDO_WRITE => match params.set(param, Fixed::from_bits(request.data as i32)) {
                    Ok(()) => SdoFrame {
                        command: SDO_WRITE_REPLY,
                        ..request
                    },
                    Err(_) => request.abort(SdoAbortCode::Range),
                },
                SDO_READ => SdoFrame {
                    command: SDO_READ_REPLY,
                    data: params.get(param).to_bits() as u32,
                    ..request
                },
                _ => request.abort(SdoAbortCode::InvalidIndex),
            }
        }
        index
            if (INDEX_MAP_START..INDEX_MAP_END).contains(&index)
                && in_range
                && request.command == SDO_WRITE =>
        {
            match add_mapping(MapRequest::decode(&request)) {
                Ok(_) => SdoFrame {
                    command: SDO_WRITE_REPLY,
                    ..request
                },
                Err(_) => request.abort(SdoAbortCode::Range),
            }
        }
        _ => request.abort(SdoAbortCode::InvalidIndex),
    }
}
