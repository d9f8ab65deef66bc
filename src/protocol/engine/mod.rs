//! Per-interface transport engine.
//!
//! [`CanEngine`] owns everything one CAN interface needs: the controller, the
//! message map, the transmit overflow buffer, the passthrough identifier list
//! and the runtime configuration. All of it sits behind one
//! `Mutex<CriticalSectionRawMutex, RefCell<_>>`, so foreground calls and the
//! interrupt entry points ([`CanEngine::handle_rx`], [`CanEngine::handle_tx`])
//! never observe a half-edited table.
//!
//! Saving to flash only holds the lock while the tables are captured; the
//! slow erase/program sequence runs unlocked with the `saving` flag raised,
//! during which periodic transmission and mapped decode are suspended.
use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::config::{CanConfig, MAX_USER_MESSAGES};
use crate::core::{Direction, ParamId};
use crate::error::{MapError, PersistError};
use crate::infra::codec::field::{decode_message, encode_message};
use crate::infra::codec::payload::Payload;
use crate::infra::persistence::PersistedImage;
use crate::protocol::mapping::{CanMap, MappingInfo};
use crate::protocol::sdo::{self, SdoFrame};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::filter::plan_filters;
use crate::protocol::transport::traits::can_controller::{CanController, RxFifo};
use crate::protocol::transport::traits::checksum::Checksum;
use crate::protocol::transport::traits::config_storage::ConfigStorage;
use crate::protocol::transport::traits::param_store::ParamStore;
use crate::protocol::transport::traits::rx_handler::RxHandler;
use crate::protocol::transport::tx_queue::{SendStatus, TxQueue};

/// Mapped messages and control frames always carry a full payload.
const FRAME_LEN: usize = 8;

//==================================================================================ENGINE_STATE
/// State guarded by the engine lock.
struct EngineState<C> {
    controller: C,
    map: CanMap,
    tx: TxQueue,
    user_ids: Vec<u32, MAX_USER_MESSAGES>,
    config: CanConfig,
}

impl<C: CanController> EngineState<C> {
    fn send(&mut self, frame: CanFrame) -> SendStatus {
        self.tx.send(&mut self.controller, frame)
    }

    /// Recompute and program the receive filters.
    fn reconfigure_filters(&mut self) {
        let plan = plan_filters(
            self.config.control_id(),
            &self.user_ids,
            self.map.table(Direction::Receive),
            self.config.filter_bank_base,
        );
        self.controller.configure_filters(&plan);
    }

    /// Execute an SDO request and queue the reply.
    fn serve_sdo<P: ParamStore + ?Sized>(&mut self, request: SdoFrame, params: &P) {
        let mut filters_dirty = false;
        let map = &mut self.map;

        let reply = sdo::process(request, params, |mapping| {
            let added = map.add(
                mapping.direction,
                mapping.param,
                mapping.id,
                mapping.offset_bits,
                mapping.width_bits,
                mapping.gain,
                0,
            );
            filters_dirty = added.is_ok() && mapping.direction.is_rx();
            added
        });

        if filters_dirty {
            self.reconfigure_filters();
        }

        let reply_id = CanId(self.config.reply_id());
        self.send(CanFrame::from_payload(
            reply_id,
            &reply.to_payload(),
            FRAME_LEN,
        ));
    }
}

/// Where an inbound frame ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxRoute {
    /// Handled as an SDO request; a reply was queued.
    Sdo,
    /// Decoded into the parameter store through the inbound table.
    Mapped,
    /// Handed to the passthrough handler (if one is installed).
    Passthrough,
    /// Ignored because a save was in progress.
    Suspended,
}

//==================================================================================CAN_ENGINE
/// Message-mapping and transport engine of one CAN interface.
pub struct CanEngine<'a, C, P: ?Sized> {
    state: Mutex<CriticalSectionRawMutex, RefCell<EngineState<C>>>,
    handler: Mutex<CriticalSectionRawMutex, RefCell<Option<&'a mut (dyn RxHandler + Send)>>>,
    saving: AtomicBool,
    params: &'a P,
}

impl<'a, C, P> CanEngine<'a, C, P>
where
    C: CanController,
    P: ParamStore + ?Sized,
{
    /// Take ownership of `controller` and program the initial filters
    /// (control identifier only).
    pub fn new(controller: C, params: &'a P, config: CanConfig) -> Self {
        let mut state = EngineState {
            controller,
            map: CanMap::new(),
            tx: TxQueue::new(),
            user_ids: Vec::new(),
            config,
        };
        state.reconfigure_filters();

        #[cfg(feature = "defmt")]
        defmt::info!("CAN engine up, node {}", config.node_id);

        Self {
            state: Mutex::new(RefCell::new(state)),
            handler: Mutex::new(RefCell::new(None)),
            saving: AtomicBool::new(false),
            params,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState<C>) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Run `f` on the owned controller, under the engine lock.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.with_state(|state| f(&mut state.controller))
    }

    /// Parameter store this engine reads and writes.
    pub fn params(&self) -> &'a P {
        self.params
    }

    pub fn config(&self) -> CanConfig {
        self.with_state(|state| state.config)
    }

    //==============================================================================MAPPING
    /// Add a mapping to the table selected by `direction`.
    ///
    /// Returns the number of active messages in that table. Inbound
    /// additions reprogram the receive filters.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &self,
        direction: Direction,
        param: ParamId,
        id: u32,
        offset_bits: u8,
        width_bits: u8,
        gain: f32,
        translation: i16,
    ) -> Result<usize, MapError> {
        self.with_state(|state| {
            let count = state
                .map
                .add(direction, param, id, offset_bits, width_bits, gain, translation)?;
            if direction.is_rx() {
                state.reconfigure_filters();
            }
            Ok(count)
        })
    }

    /// Outbound mapping without translation.
    pub fn add_send(
        &self,
        param: ParamId,
        id: u32,
        offset_bits: u8,
        width_bits: u8,
        gain: f32,
    ) -> Result<usize, MapError> {
        self.add(Direction::Send, param, id, offset_bits, width_bits, gain, 0)
    }

    /// Inbound mapping without translation.
    pub fn add_recv(
        &self,
        param: ParamId,
        id: u32,
        offset_bits: u8,
        width_bits: u8,
        gain: f32,
    ) -> Result<usize, MapError> {
        self.add(Direction::Receive, param, id, offset_bits, width_bits, gain, 0)
    }

    /// Remove every mapping of `param`. Returns the number of removed fields.
    pub fn remove(&self, param: ParamId) -> usize {
        self.with_state(|state| {
            let removed = state.map.remove(param);
            if removed > 0 {
                state.reconfigure_filters();
            }
            removed
        })
    }

    /// Drop every mapping of both tables.
    pub fn clear(&self) {
        self.with_state(|state| {
            state.map.clear();
            state.reconfigure_filters();
        });
    }

    pub fn find_map(&self, param: ParamId) -> Option<MappingInfo> {
        self.with_state(|state| state.map.find_map(param))
    }

    /// Visit every mapping, outbound table first.
    ///
    /// The visitor runs under the engine lock and must not call back into
    /// this engine.
    pub fn for_each_mapping<F: FnMut(&MappingInfo)>(&self, visitor: F) {
        self.with_state(|state| state.map.for_each(visitor));
    }

    /// Active messages in the table selected by `direction`.
    pub fn message_count(&self, direction: Direction) -> usize {
        self.with_state(|state| state.map.table(direction).len())
    }

    //==============================================================================PASSTHROUGH
    /// Accept frames with identifier `id` and hand them to the receive
    /// handler untouched.
    pub fn register_user_message(&self, id: u32) -> Result<(), MapError> {
        let id = CanId::new(id)?;
        self.with_state(|state| {
            state
                .user_ids
                .push(id.raw())
                .map_err(|_| MapError::UserListFull)?;
            state.reconfigure_filters();
            Ok(())
        })
    }

    /// Install the handler for frames that are neither control requests nor
    /// mapped inbound messages. Replaces any previous handler, including the
    /// running one when called from inside it.
    pub fn set_receive_handler(&self, handler: &'a mut (dyn RxHandler + Send)) {
        self.handler.lock(|cell| *cell.borrow_mut() = Some(handler));
    }

    //==============================================================================NODE
    pub fn node_id(&self) -> u8 {
        self.with_state(|state| state.config.node_id)
    }

    /// Change the local node id. The filters follow the new control id.
    pub fn set_node_id(&self, node_id: u8) {
        self.with_state(|state| {
            state.config.node_id = node_id;
            state.reconfigure_filters();
        });
    }

    //==============================================================================TRANSMIT
    /// Send one frame, buffering it if every mailbox is busy.
    pub fn send(&self, id: CanId, payload: &Payload, len: usize) -> SendStatus {
        self.send_frame(CanFrame::from_payload(id, payload, len))
    }

    pub fn send_frame(&self, frame: CanFrame) -> SendStatus {
        self.with_state(|state| state.send(frame))
    }

    /// Encode and send every outbound message.
    ///
    /// Does nothing while a save is in progress. Returns the number of
    /// messages handed to the transmit path.
    pub fn send_all(&self) -> usize {
        if self.saving.load(Ordering::Acquire) {
            return 0;
        }

        self.with_state(|state| {
            let EngineState {
                controller,
                map,
                tx,
                ..
            } = state;

            let mut sent = 0;
            for message in map.table(Direction::Send).iter() {
                let payload = encode_message(message, self.params);
                tx.send(controller, CanFrame::from_payload(message.id(), &payload, FRAME_LEN));
                sent += 1;
            }
            sent
        })
    }

    /// Frames waiting in the overflow buffer.
    pub fn pending_frames(&self) -> usize {
        self.with_state(|state| state.tx.len())
    }

    /// Transmit-mailbox-empty interrupt entry point.
    ///
    /// Returns the number of buffered frames handed to the hardware.
    pub fn handle_tx(&self) -> usize {
        self.with_state(|state| state.tx.drain(&mut state.controller))
    }

    /// Write `data` to `index`/`sub_index` of the remote node `remote_node`.
    pub fn sdo_write(&self, remote_node: u8, index: u16, sub_index: u8, data: u32) -> SendStatus {
        let request = SdoFrame::write_request(index, sub_index, data);
        self.with_state(|state| {
            let id = CanId(state.config.request_base + remote_node as u32);
            state.send(CanFrame::from_payload(id, &request.to_payload(), FRAME_LEN))
        })
    }

    //==============================================================================RECEIVE
    /// Receive-FIFO interrupt entry point: process every frame waiting in
    /// `fifo`. Returns the number of frames processed.
    pub fn handle_rx(&self, fifo: RxFifo) -> usize {
        let mut processed = 0;
        while let Some(frame) = self.with_controller(|controller| controller.try_receive(fifo)) {
            self.process_frame(&frame);
            processed += 1;
        }
        processed
    }

    /// Route one inbound frame.
    ///
    /// The receive handler is called with no lock held, so it may send
    /// frames, edit the map or process further frames. Passthrough frames
    /// routed while it runs are not delivered to it.
    pub fn process_frame(&self, frame: &CanFrame) -> RxRoute {
        let route = self.with_state(|state| {
            if frame.id.raw() == state.config.control_id() && frame.len == FRAME_LEN {
                state.serve_sdo(SdoFrame::from_payload(&frame.payload()), self.params);
                return RxRoute::Sdo;
            }

            if self.saving.load(Ordering::Acquire) {
                return RxRoute::Suspended;
            }

            match state.map.table(Direction::Receive).find_by_id(frame.id) {
                Some(message) => {
                    decode_message(message, &frame.payload(), self.params);
                    RxRoute::Mapped
                }
                None => RxRoute::Passthrough,
            }
        });

        if route == RxRoute::Passthrough {
            // Out of its slot while it runs, so it may call back into the engine.
            if let Some(handler) = self.handler.lock(|cell| cell.borrow_mut().take()) {
                handler.on_frame(frame);
                self.handler.lock(|cell| {
                    let mut slot = cell.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(handler);
                    }
                });
            }
        }
        route
    }

    //==============================================================================PERSISTENCE
    /// Store both tables in `storage`.
    ///
    /// Parameters are written by unique id; mappings of parameters without
    /// one are left out. Returns the checksum written.
    pub fn save<S, K>(&self, storage: &mut S, checksum: &mut K) -> Result<u32, PersistError<S::Error>>
    where
        S: ConfigStorage,
        K: Checksum,
    {
        self.saving.store(true, Ordering::Release);

        let mut image = self.with_state(|state| PersistedImage::capture(&state.map, self.params));
        let result = image.write(storage, checksum);

        self.saving.store(false, Ordering::Release);

        #[cfg(feature = "defmt")]
        if let Ok(crc) = &result {
            defmt::info!("Message map saved, checksum {:#x}", crc);
        }
        result
    }

    /// Replace both tables with the image stored in `storage`.
    ///
    /// The tables are cleared first; on any error they stay empty. Filters
    /// are reprogrammed in both cases.
    pub fn load<S, K>(&self, storage: &mut S, checksum: &mut K) -> Result<(), PersistError<S::Error>>
    where
        S: ConfigStorage,
        K: Checksum,
    {
        self.with_state(|state| state.map.clear());

        let result = PersistedImage::read(storage, checksum);

        self.with_state(|state| {
            if let Ok(image) = &result {
                state.map = image.restore(self.params);
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "Message map loaded: {} outbound, {} inbound",
                    state.map.table(Direction::Send).len(),
                    state.map.table(Direction::Receive).len()
                );
            }
            state.reconfigure_filters();
        });

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                #[cfg(feature = "defmt")]
                match &err {
                    PersistError::ChecksumMismatch { stored, computed } => defmt::warn!(
                        "Stored message map rejected, checksum {:#x} != {:#x}",
                        stored,
                        computed
                    ),
                    PersistError::Storage(_) => defmt::warn!("Stored message map unreadable"),
                }
                Err(err)
            }
        }
    }
}
