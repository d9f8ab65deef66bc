//! Test doubles simulating the CAN peripheral, the parameter store and the
//! configuration flash during integration tests.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};

use korri_canmap::error::ParamError;
use korri_canmap::protocol::transport::filter::FilterBank;
use korri_canmap::protocol::transport::traits::{
    can_controller::{CanController, RxFifo},
    config_storage::ConfigStorage,
    param_store::ParamStore,
};
use korri_canmap::{CanEngine, CanFrame, Fixed, ParamId};

#[allow(dead_code)]
pub const PARAM_COUNT: u16 = 16;
/// Indices from here on are read-only spot values.
#[allow(dead_code)]
pub const FIRST_SPOT_VALUE: u16 = 12;
/// Unique ids are `UID_BASE + index`.
#[allow(dead_code)]
pub const UID_BASE: u16 = 100;
#[allow(dead_code)]
pub const LIMIT: i32 = 1_000;

const ZERO: AtomicI32 = AtomicI32::new(0);

/// Lock-free parameter store, usable from a `static`.
pub struct AtomicParams {
    values: [AtomicI32; PARAM_COUNT as usize],
}

#[allow(dead_code)]
impl AtomicParams {
    pub const fn new() -> Self {
        Self {
            values: [ZERO; PARAM_COUNT as usize],
        }
    }

    pub fn value(&self, index: u16) -> Fixed {
        Fixed::from_bits(self.values[index as usize].load(Ordering::Relaxed))
    }

    pub fn put(&self, index: u16, value: Fixed) {
        self.values[index as usize].store(value.to_bits(), Ordering::Relaxed);
    }
}

impl ParamStore for AtomicParams {
    fn count(&self) -> u16 {
        PARAM_COUNT
    }

    fn is_param(&self, param: ParamId) -> bool {
        param.0 < FIRST_SPOT_VALUE
    }

    fn get(&self, param: ParamId) -> Fixed {
        self.values
            .get(param.0 as usize)
            .map(|value| Fixed::from_bits(value.load(Ordering::Relaxed)))
            .unwrap_or(Fixed::ZERO)
    }

    fn set(&self, param: ParamId, value: Fixed) -> Result<(), ParamError> {
        if !self.is_param(param) {
            return Err(ParamError::Unknown);
        }
        if value.to_int().abs() > LIMIT {
            return Err(ParamError::OutOfRange);
        }
        self.values[param.0 as usize].store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    fn set_fixed(&self, param: ParamId, value: Fixed) {
        if let Some(slot) = self.values.get(param.0 as usize) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    fn unique_id(&self, param: ParamId) -> Option<u16> {
        (param.0 < PARAM_COUNT).then(|| UID_BASE + param.0)
    }

    fn from_unique_id(&self, uid: u16) -> Option<ParamId> {
        uid.checked_sub(UID_BASE)
            .filter(|index| *index < PARAM_COUNT)
            .map(ParamId)
    }
}

/// CAN peripheral double with three mailboxes that only free up when the
/// test says so, two receive FIFOs and list-mode filters.
#[derive(Default)]
pub struct MockController {
    pub busy_mailboxes: usize,
    pub wire: Vec<CanFrame>,
    pub fifo0: VecDeque<CanFrame>,
    pub fifo1: VecDeque<CanFrame>,
    pub tx_interrupt: bool,
    pub filters: Vec<FilterBank>,
}

#[allow(dead_code)]
pub const MAILBOXES: usize = 3;

#[allow(dead_code)]
impl MockController {
    /// Controller whose mailboxes are all occupied.
    pub fn saturated() -> Self {
        Self {
            busy_mailboxes: MAILBOXES,
            ..Default::default()
        }
    }

    /// FIFO a frame with identifier `id` would be delivered to, if accepted.
    pub fn accepts(&self, id: u32) -> Option<RxFifo> {
        self.filters
            .iter()
            .find(|bank| bank.ids.contains(&id))
            .map(|bank| bank.fifo)
    }

    /// Push `frame` through the filters into a receive FIFO.
    pub fn receive(&mut self, frame: CanFrame) -> Option<RxFifo> {
        let fifo = self.accepts(frame.id.raw())?;
        match fifo {
            RxFifo::Fifo0 => self.fifo0.push_back(frame),
            RxFifo::Fifo1 => self.fifo1.push_back(frame),
        }
        Some(fifo)
    }

    /// Mailboxes finished transmitting.
    pub fn free_mailboxes(&mut self) {
        self.busy_mailboxes = 0;
    }
}

impl CanController for MockController {
    type Error = ();

    fn try_transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if self.busy_mailboxes >= MAILBOXES {
            return Err(());
        }
        self.wire.push(frame.clone());
        Ok(())
    }

    fn try_receive(&mut self, fifo: RxFifo) -> Option<CanFrame> {
        match fifo {
            RxFifo::Fifo0 => self.fifo0.pop_front(),
            RxFifo::Fifo1 => self.fifo1.pop_front(),
        }
    }

    fn set_tx_complete_interrupt(&mut self, enabled: bool) {
        self.tx_interrupt = enabled;
    }

    fn configure_filters(&mut self, banks: &[FilterBank]) {
        self.filters = banks.to_vec();
    }
}

/// Move every frame `from` put on the wire into the FIFOs of `to`, then run
/// the receive interrupts of `to`. Returns the number of frames delivered.
#[allow(dead_code)]
pub fn deliver<P: ParamStore + ?Sized>(
    from: &CanEngine<'_, MockController, P>,
    to: &CanEngine<'_, MockController, P>,
) -> usize {
    let frames: Vec<CanFrame> = from.with_controller(|controller| controller.wire.drain(..).collect());
    let delivered = to.with_controller(|controller| {
        frames
            .into_iter()
            .filter_map(|frame| controller.receive(frame))
            .count()
    });
    to.handle_rx(RxFifo::Fifo0);
    to.handle_rx(RxFifo::Fifo1);
    delivered
}

#[derive(Debug, PartialEq, Eq)]
pub enum FlashError {
    NotErased(usize),
    OutOfBounds(usize),
}

/// Flash page double: programming a word twice without an erase fails.
pub struct MockFlash {
    pub words: Vec<u32>,
    pub erases: usize,
}

#[allow(dead_code)]
impl MockFlash {
    pub fn new(words: usize) -> Self {
        Self {
            words: std::vec![u32::MAX; words],
            erases: 0,
        }
    }
}

impl ConfigStorage for MockFlash {
    type Error = FlashError;

    fn erase(&mut self) -> Result<(), Self::Error> {
        self.words.fill(u32::MAX);
        self.erases += 1;
        Ok(())
    }

    fn program_word(&mut self, index: usize, value: u32) -> Result<(), Self::Error> {
        let word = self
            .words
            .get_mut(index)
            .ok_or(FlashError::OutOfBounds(index))?;
        if *word != u32::MAX {
            return Err(FlashError::NotErased(index));
        }
        *word = value;
        Ok(())
    }

    fn read_word(&mut self, index: usize) -> Result<u32, Self::Error> {
        self.words
            .get(index)
            .copied()
            .ok_or(FlashError::OutOfBounds(index))
    }
}
