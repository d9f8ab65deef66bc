//! Test doubles shared by the unit tests of this crate.
use core::cell::Cell;
use std::vec::Vec;

use crate::core::{Fixed, ParamId};
use crate::error::ParamError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::filter::FilterBank;
use crate::infra::persistence::IMAGE_WORDS;
use crate::protocol::transport::traits::can_controller::{CanController, RxFifo};
use crate::protocol::transport::traits::config_storage::ConfigStorage;
use crate::protocol::transport::traits::param_store::ParamStore;

pub(crate) const PARAM_COUNT: u16 = 16;
/// Indices below this are settable parameters; the rest are spot values.
pub(crate) const FIRST_SPOT_VALUE: u16 = 8;
/// Settable parameters accept values in `-LIMIT..=LIMIT`.
pub(crate) const LIMIT: i32 = 10_000;

/// Parameter store backed by `Cell`s. Unique ids are the reversed index
/// (`PARAM_COUNT - 1 - index`) so enumerated and persisted forms differ.
pub(crate) struct TestParams {
    values: [Cell<Fixed>; PARAM_COUNT as usize],
}

impl TestParams {
    pub(crate) fn new() -> Self {
        Self {
            values: core::array::from_fn(|_| Cell::new(Fixed::ZERO)),
        }
    }

    pub(crate) fn value(&self, index: u16) -> Fixed {
        self.values[index as usize].get()
    }

    pub(crate) fn put(&self, index: u16, value: Fixed) {
        self.values[index as usize].set(value);
    }
}

impl ParamStore for TestParams {
    fn count(&self) -> u16 {
        PARAM_COUNT
    }

    fn is_param(&self, param: ParamId) -> bool {
        param.0 < FIRST_SPOT_VALUE
    }

    fn get(&self, param: ParamId) -> Fixed {
        self.values
            .get(param.0 as usize)
            .map(Cell::get)
            .unwrap_or(Fixed::ZERO)
    }

    fn set(&self, param: ParamId, value: Fixed) -> Result<(), ParamError> {
        let slot = self.values.get(param.0 as usize).ok_or(ParamError::Unknown)?;
        if !(-LIMIT..=LIMIT).contains(&value.to_int()) {
            return Err(ParamError::OutOfRange);
        }
        slot.set(value);
        Ok(())
    }

    fn set_fixed(&self, param: ParamId, value: Fixed) {
        if let Some(slot) = self.values.get(param.0 as usize) {
            slot.set(value);
        }
    }

    fn unique_id(&self, param: ParamId) -> Option<u16> {
        (param.0 < PARAM_COUNT).then(|| PARAM_COUNT - 1 - param.0)
    }

    fn from_unique_id(&self, uid: u16) -> Option<ParamId> {
        (uid < PARAM_COUNT).then(|| ParamId(PARAM_COUNT - 1 - uid))
    }
}

/// Controller double: rejects a scripted number of transmissions, then
/// accepts everything; records what reached the wire.
#[derive(Default)]
pub(crate) struct TestController {
    pub(crate) reject_next: usize,
    pub(crate) mailboxes_full: bool,
    pub(crate) sent: Vec<CanFrame>,
    pub(crate) rx0: Vec<CanFrame>,
    pub(crate) rx1: Vec<CanFrame>,
    pub(crate) tx_interrupt: bool,
    pub(crate) filters: Vec<FilterBank>,
    pub(crate) filter_commits: usize,
}

impl CanController for TestController {
    type Error = ();

    fn try_transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if self.mailboxes_full {
            return Err(());
        }
        if self.reject_next > 0 {
            self.reject_next -= 1;
            return Err(());
        }
        self.sent.push(frame.clone());
        Ok(())
    }

    fn try_receive(&mut self, fifo: RxFifo) -> Option<CanFrame> {
        let queue = match fifo {
            RxFifo::Fifo0 => &mut self.rx0,
            RxFifo::Fifo1 => &mut self.rx1,
        };
        (!queue.is_empty()).then(|| queue.remove(0))
    }

    fn set_tx_complete_interrupt(&mut self, enabled: bool) {
        self.tx_interrupt = enabled;
    }

    fn configure_filters(&mut self, banks: &[FilterBank]) {
        self.filters = banks.to_vec();
        self.filter_commits += 1;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FlashError {
    NotErased(usize),
    OutOfRange(usize),
}

/// Flash region double: words can only be programmed after an erase.
pub(crate) struct TestFlash {
    pub(crate) words: Vec<u32>,
    pub(crate) erase_count: usize,
}

impl TestFlash {
    pub(crate) fn new() -> Self {
        Self {
            words: std::vec![u32::MAX; IMAGE_WORDS],
            erase_count: 0,
        }
    }
}

impl ConfigStorage for TestFlash {
    type Error = FlashError;

    fn erase(&mut self) -> Result<(), Self::Error> {
        self.words.iter_mut().for_each(|word| *word = u32::MAX);
        self.erase_count += 1;
        Ok(())
    }

    fn program_word(&mut self, index: usize, value: u32) -> Result<(), Self::Error> {
        let word = self.words.get_mut(index).ok_or(FlashError::OutOfRange(index))?;
        if *word != u32::MAX {
            return Err(FlashError::NotErased(index));
        }
        *word = value;
        Ok(())
    }

    fn read_word(&mut self, index: usize) -> Result<u32, Self::Error> {
        self.words.get(index).copied().ok_or(FlashError::OutOfRange(index))
    }
}
