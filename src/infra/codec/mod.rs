//! Payload codec: raw 64-bit payload access and parameter field scaling.
pub mod field;
pub mod payload;
