//! Software overflow buffer in front of the hardware transmit mailboxes.
//!
//! Frames that find every mailbox busy are pushed on a bounded stack and sent
//! from the "transmit mailbox empty" interrupt. The interrupt is only enabled
//! while the stack holds frames, and it is masked while `send` runs so the
//! drain can never interleave with a push.
use heapless::Vec;

use crate::config::SEND_BUFFER_LEN;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::can_controller::CanController;

/// Outcome of [`TxQueue::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    /// A mailbox accepted the frame.
    Sent,
    /// The frame waits in the overflow buffer.
    Queued,
    /// Mailboxes and buffer were full; the frame is lost.
    Dropped,
}

/// Bounded LIFO of frames waiting for a free mailbox.
#[derive(Clone, Debug, Default)]
pub struct TxQueue {
    pending: Vec<CanFrame, SEND_BUFFER_LEN>,
}

impl TxQueue {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Number of buffered frames.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Buffered frames, bottom of the stack first.
    pub fn pending(&self) -> &[CanFrame] {
        &self.pending
    }

    /// Try the hardware first, buffer on rejection.
    pub fn send<C: CanController>(&mut self, controller: &mut C, frame: CanFrame) -> SendStatus {
        controller.set_tx_complete_interrupt(false);

        let status = match controller.try_transmit(&frame) {
            Ok(()) => SendStatus::Sent,
            Err(_) => match self.pending.push(frame) {
                Ok(()) => SendStatus::Queued,
                Err(_frame) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("TX buffer full, dropping frame {:#x}", _frame.id.0);
                    SendStatus::Dropped
                }
            },
        };

        if !self.pending.is_empty() {
            controller.set_tx_complete_interrupt(true);
        }
        status
    }

    /// Send buffered frames, most recent first, until the hardware refuses
    /// one. Disables the interrupt once the buffer is empty.
    ///
    /// Returns the number of frames handed to the hardware.
    pub fn drain<C: CanController>(&mut self, controller: &mut C) -> usize {
        let mut sent = 0;

        while let Some(frame) = self.pending.last() {
            if controller.try_transmit(frame).is_err() {
                break;
            }
            self.pending.pop();
            sent += 1;
        }

        if self.pending.is_empty() {
            controller.set_tx_complete_interrupt(false);
        }
        sent
    }

    /// Forget every buffered frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
