//! Minimal abstraction of a CAN controller with hardware transmit mailboxes,
//! two receive FIFOs and list-mode identifier filters. Allows the engine to
//! plug into a HAL driver on target and into a mock on the host.
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::filter::FilterBank;

/// Receive FIFO of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxFifo {
    Fifo0,
    Fifo1,
}

impl RxFifo {
    /// FIFO that filter bank `bank` delivers into (even banks to FIFO 0).
    #[inline]
    pub fn for_bank(bank: usize) -> Self {
        if bank & 1 == 0 {
            RxFifo::Fifo0
        } else {
            RxFifo::Fifo1
        }
    }
}

/// Non-blocking access to the CAN peripheral.
///
/// Every method must return immediately; the engine never waits on hardware.
pub trait CanController {
    type Error: core::fmt::Debug;

    /// Place `frame` in a free transmit mailbox.
    ///
    /// Returns an error when no mailbox is available (or the driver refuses
    /// the frame for any other reason); the engine then buffers the frame.
    fn try_transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Pop the next frame from `fifo`, if any.
    fn try_receive(&mut self, fifo: RxFifo) -> Option<CanFrame>;

    /// Enable or disable the "transmit mailbox empty" interrupt.
    fn set_tx_complete_interrupt(&mut self, enabled: bool);

    /// Program the identifier filters. `banks` is the complete plan; banks
    /// not listed are left to the implementation (typically deactivated).
    fn configure_filters(&mut self, banks: &[FilterBank]);
}
