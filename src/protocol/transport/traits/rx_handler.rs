//! Passthrough handler for frames that are neither SDO requests nor mapped
//! inbound messages (typically the identifiers registered with
//! `register_user_message`).
use crate::protocol::transport::can_frame::CanFrame;

/// Receives unmapped frames verbatim.
pub trait RxHandler {
    fn on_frame(&mut self, frame: &CanFrame);
}

impl<F: FnMut(&CanFrame)> RxHandler for F {
    fn on_frame(&mut self, frame: &CanFrame) {
        self(frame)
    }
}
