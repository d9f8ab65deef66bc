//! Abstraction traits for the collaborators of the engine (CAN controller,
//! parameter store, configuration flash, checksum unit, passthrough handler).
pub mod can_controller;
pub mod checksum;
pub mod config_storage;
pub mod param_store;
pub mod rx_handler;
