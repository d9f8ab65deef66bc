//! High-level components of the CAN layer: the message map, the SDO server,
//! the per-interface engine, interrupt dispatch and the transport primitives.
pub mod dispatch;
pub mod engine;
pub mod mapping;
pub mod sdo;
pub mod transport;
