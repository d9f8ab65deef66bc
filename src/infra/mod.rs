//! Infrastructure shared by the protocol layer: bit-level payload codec and
//! the persisted image of the message map.
pub mod codec;
pub mod persistence;
