//! `korri-canmap` library: binds application parameters to bit-fields of
//! classic CAN frames in a `no_std` environment. The crate exposes the
//! infrastructure modules (field codec, persisted image), the protocol logic
//! (message map, SDO server, transmit/receive engine, interrupt dispatch) and
//! the collaborator traits a board support layer implements.
#![no_std]
//==================================================================================
#[cfg(test)]
extern crate std;
//==================================================================================
/// Core data types shared by the codec, the map and the persisted image.
pub mod core;
/// Compile-time capacities and per-interface runtime configuration.
pub mod config;
/// Domain errors (map edits, parameter access, persistence, SDO aborts).
pub mod error;
/// Bit-level codec and the persisted form of the message map.
pub mod infra;
/// Message map, SDO service, transport engine and interrupt dispatch.
pub mod protocol;

#[cfg(test)]
mod test_support;
//==================================================================================
pub use config::CanConfig;
pub use crate::core::{Direction, Fixed, ParamId};
pub use error::{MapError, ParamError, PersistError, SdoAbortCode};
pub use protocol::dispatch::{CanInterrupts, Interface, InterruptTable};
pub use protocol::engine::{CanEngine, RxRoute};
pub use protocol::transport::can_frame::CanFrame;
pub use protocol::transport::can_id::CanId;
