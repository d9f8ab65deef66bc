//! Field codec: moves parameter values in and out of a [`Payload`] according
//! to a [`FieldMapping`].
//!
//! * Encode: `raw = trunc(value * gain + translation)`, masked to the width.
//! * Decode: `value = (raw + translation) * gain`, `raw` read as unsigned.
//!
//! An inbound mapping therefore inverts an outbound one when it uses gain
//! `1 / g` and translation `-t`.
use crate::core::Fixed;
use crate::error::ParamError;
use crate::infra::codec::payload::Payload;
use crate::protocol::mapping::{FieldMapping, MessageDefinition};
use crate::protocol::transport::traits::param_store::ParamStore;

/// Raw integer sent on the wire for `value`.
pub fn to_raw(mapping: &FieldMapping, value: Fixed) -> u32 {
    let scaled = value.to_f32() * mapping.gain + mapping.translation as f32;
    // Truncate toward zero through i64 so the whole u32 range survives;
    // negative values wrap to two's complement bits.
    scaled as i64 as u32
}

/// Parameter value represented by the wire integer `raw`.
pub fn from_raw(mapping: &FieldMapping, raw: u32) -> Fixed {
    Fixed::from_f32((raw as f32 + mapping.translation as f32) * mapping.gain)
}

/// Read the bound parameter and OR its encoding into `payload`.
pub fn encode_field<P: ParamStore + ?Sized>(payload: &mut Payload, mapping: &FieldMapping, params: &P) {
    let raw = to_raw(mapping, params.get(mapping.param));
    payload.insert_bits(mapping.offset_bits, mapping.width_bits, raw);
}

/// Extract the field from `payload` and write it into the parameter store.
///
/// Settable parameters go through the range-checked setter; anything else
/// (spot values) is written with `set_fixed`.
pub fn decode_field<P: ParamStore + ?Sized>(
    payload: &Payload,
    mapping: &FieldMapping,
    params: &P,
) -> Result<(), ParamError> {
    let raw = payload.extract_bits(mapping.offset_bits, mapping.width_bits);
    let value = from_raw(mapping, raw);

    if params.is_param(mapping.param) {
        params.set(mapping.param, value)
    } else {
        params.set_fixed(mapping.param, value);
        Ok(())
    }
}

/// Encode every field of an outbound message into a fresh payload.
pub fn encode_message<P: ParamStore + ?Sized>(message: &MessageDefinition, params: &P) -> Payload {
    let mut payload = Payload::EMPTY;
    for mapping in message.fields() {
        encode_field(&mut payload, mapping, params);
    }
    payload
}

/// Decode every field of an inbound message. Fields rejected by the store are
/// skipped; the number of rejections is returned.
pub fn decode_message<P: ParamStore + ?Sized>(
    message: &MessageDefinition,
    payload: &Payload,
    params: &P,
) -> usize {
    let mut rejected = 0;
    for mapping in message.fields() {
        if let Err(_err) = decode_field(payload, mapping, params) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Rejected value for param {}: {}", mapping.param, _err);
            rejected += 1;
        }
    }
    rejected
}
