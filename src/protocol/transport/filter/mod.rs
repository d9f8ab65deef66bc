//! Receive filter planner: derives the hardware identifier-list filters from
//! the identifiers the node is interested in.
//!
//! The list is always, in order: the SDO control identifier, the registered
//! passthrough identifiers, then every inbound message identifier. It is cut
//! into banks of [`IDS_PER_BANK`] entries; unused entries of the last bank
//! are zero.
use heapless::Vec;

use crate::config::{IDS_PER_BANK, MAX_FILTER_BANKS};
use crate::protocol::mapping::MessageTable;
use crate::protocol::transport::traits::can_controller::RxFifo;

/// One hardware filter bank in identifier-list mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterBank {
    /// Hardware bank number.
    pub number: usize,
    /// Accepted identifiers.
    pub ids: [u32; IDS_PER_BANK],
    /// FIFO receiving the matches.
    pub fifo: RxFifo,
}

/// Complete filter configuration of one interface.
pub type FilterPlan = Vec<FilterBank, MAX_FILTER_BANKS>;

/// Build the filter plan. Pure function of its inputs.
pub fn plan_filters(
    control_id: u32,
    user_ids: &[u32],
    inbound: &MessageTable,
    bank_base: usize,
) -> FilterPlan {
    let mut plan = FilterPlan::new();
    let mut ids = [0u32; IDS_PER_BANK];
    let mut filled = 0;

    let wanted = core::iter::once(control_id)
        .chain(user_ids.iter().copied())
        .chain(inbound.iter().map(|message| message.id().raw()));

    for id in wanted {
        ids[filled] = id;
        filled += 1;

        if filled == IDS_PER_BANK {
            commit(&mut plan, &mut ids, bank_base);
            filled = 0;
        }
    }

    if filled > 0 {
        commit(&mut plan, &mut ids, bank_base);
    }

    #[cfg(feature = "defmt")]
    defmt::trace!("Filter plan: {} banks from base {}", plan.len(), bank_base);
    plan
}

fn commit(plan: &mut FilterPlan, ids: &mut [u32; IDS_PER_BANK], bank_base: usize) {
    let number = bank_base + plan.len();
    // Capacity covers control id + every user id + every inbound message.
    let _ = plan.push(FilterBank {
        number,
        ids: *ids,
        fifo: RxFifo::for_bank(number),
    });
    *ids = [0; IDS_PER_BANK];
}
