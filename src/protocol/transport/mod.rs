//! CAN transport layer: frame and identifier representations, receive filter
//! planning, the transmit overflow buffer and the collaborator traits.
pub mod can_frame;
pub mod can_id;
pub mod filter;
pub mod traits;
pub mod tx_queue;
