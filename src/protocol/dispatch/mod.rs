//! Interrupt dispatch for up to two CAN interfaces.
//!
//! Interrupt vectors are free functions, so they cannot carry a reference to
//! the engine they serve. The application builds one [`InterruptTable`] at
//! start-up (typically in a `static`), binds each engine to its
//! [`Interface`], and calls the matching entry point from each vector:
//!
//! ```ignore
//! #[interrupt]
//! fn CAN1_RX0() {
//!     TABLE.rx0(Interface::Can1);
//! }
//! ```
use crate::protocol::engine::CanEngine;
use crate::protocol::transport::traits::can_controller::{CanController, RxFifo};
use crate::protocol::transport::traits::param_store::ParamStore;

/// Physical CAN interface served by an entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interface {
    Can1,
    Can2,
}

/// Interrupt-side view of an engine.
pub trait CanInterrupts: Sync {
    /// A receive FIFO holds at least one frame.
    fn on_rx(&self, fifo: RxFifo) -> usize;
    /// A transmit mailbox became free.
    fn on_tx(&self) -> usize;
}

impl<C, P> CanInterrupts for CanEngine<'_, C, P>
where
    C: CanController + Send,
    P: ParamStore + Sync + ?Sized,
{
    fn on_rx(&self, fifo: RxFifo) -> usize {
        self.handle_rx(fifo)
    }

    fn on_tx(&self) -> usize {
        self.handle_tx()
    }
}

/// Interface-to-engine bindings, fixed once built.
#[derive(Clone, Copy, Default)]
pub struct InterruptTable<'a> {
    can1: Option<&'a dyn CanInterrupts>,
    can2: Option<&'a dyn CanInterrupts>,
}

impl<'a> InterruptTable<'a> {
    pub const fn new() -> Self {
        Self {
            can1: None,
            can2: None,
        }
    }

    /// Bind `engine` to `interface`, replacing any previous binding.
    pub const fn with(mut self, interface: Interface, engine: &'a dyn CanInterrupts) -> Self {
        match interface {
            Interface::Can1 => self.can1 = Some(engine),
            Interface::Can2 => self.can2 = Some(engine),
        }
        self
    }

    /// Engine bound to `interface`.
    pub fn get(&self, interface: Interface) -> Option<&'a dyn CanInterrupts> {
        match interface {
            Interface::Can1 => self.can1,
            Interface::Can2 => self.can2,
        }
    }

    /// FIFO 0 interrupt. Returns the number of frames processed.
    pub fn rx0(&self, interface: Interface) -> usize {
        self.rx(interface, RxFifo::Fifo0)
    }

    /// FIFO 1 interrupt. Returns the number of frames processed.
    pub fn rx1(&self, interface: Interface) -> usize {
        self.rx(interface, RxFifo::Fifo1)
    }

    pub fn rx(&self, interface: Interface, fifo: RxFifo) -> usize {
        match self.get(interface) {
            Some(engine) => engine.on_rx(fifo),
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("RX interrupt on unbound interface {}", interface);
                0
            }
        }
    }

    /// Transmit-mailbox-empty interrupt. Returns the number of buffered
    /// frames handed to the hardware.
    pub fn tx(&self, interface: Interface) -> usize {
        self.get(interface).map_or(0, |engine| engine.on_tx())
    }
}
