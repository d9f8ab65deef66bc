//! Message map: the outbound and inbound tables binding parameters to bit
//! ranges of CAN frames.
//!
//! Both tables are fixed-capacity and always packed: messages occupy slots
//! `0..len` and each message's fields occupy slots `0..fields().len()`. Edits
//! either append or rebuild the table, so no gap can ever appear.
use heapless::Vec;

use crate::config::{MAX_ITEMS_PER_MESSAGE, MAX_MESSAGES};
use crate::core::{Direction, ParamId};
use crate::error::MapError;
use crate::protocol::transport::can_id::CanId;

//==================================================================================FIELD_MAPPING
/// One parameter bound to a bit range of a message payload.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldMapping {
    /// Bound parameter (enumerated index).
    pub param: ParamId,
    /// First payload bit, 0..=63.
    pub offset_bits: u8,
    /// Field width, 1..=32.
    pub width_bits: u8,
    /// Multiplicative gain.
    pub gain: f32,
    /// Additive integer translation.
    pub translation: i16,
}

impl FieldMapping {
    /// Validated constructor.
    pub fn new(
        param: ParamId,
        offset_bits: u8,
        width_bits: u8,
        gain: f32,
        translation: i16,
    ) -> Result<Self, MapError> {
        if offset_bits > 63 {
            return Err(MapError::InvalidOffset);
        }
        if width_bits == 0 || width_bits > 32 {
            return Err(MapError::InvalidLength);
        }
        Ok(Self {
            param,
            offset_bits,
            width_bits,
            gain,
            translation,
        })
    }
}

//==================================================================================MESSAGE_DEFINITION
/// One CAN identifier and its ordered field list.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageDefinition {
    id: CanId,
    fields: Vec<FieldMapping, MAX_ITEMS_PER_MESSAGE>,
}

impl MessageDefinition {
    /// Empty message for `id`.
    pub const fn new(id: CanId) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> CanId {
        self.id
    }

    /// Active fields in slot order.
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Append a field to the first free slot.
    pub fn push_field(&mut self, field: FieldMapping) -> Result<(), MapError> {
        self.fields.push(field).map_err(|_| MapError::MaxItems)
    }
}

//==================================================================================MESSAGE_TABLE
/// Fixed-capacity, packed list of message definitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageTable {
    messages: Vec<MessageDefinition, MAX_MESSAGES>,
}

impl MessageTable {
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Number of active messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Active messages in slot order.
    pub fn messages(&self) -> &[MessageDefinition] {
        &self.messages
    }

    pub fn iter(&self) -> core::slice::Iter<'_, MessageDefinition> {
        self.messages.iter()
    }

    /// First message with identifier `id`.
    pub fn find_by_id(&self, id: CanId) -> Option<&MessageDefinition> {
        self.messages.iter().find(|message| message.id == id)
    }

    /// Append a complete message to the first free slot.
    pub fn push(&mut self, message: MessageDefinition) -> Result<(), MapError> {
        self.messages.push(message).map_err(|_| MapError::MaxMessages)
    }

    /// Bind `field` into the message `id`, allocating the message if needed.
    ///
    /// Returns the number of active messages in the table.
    pub fn add(&mut self, id: CanId, field: FieldMapping) -> Result<usize, MapError> {
        let slot = match self.messages.iter().position(|message| message.id == id) {
            Some(slot) => slot,
            None => {
                self.push(MessageDefinition::new(id))?;
                self.messages.len() - 1
            }
        };

        self.messages[slot].push_field(field)?;
        Ok(self.messages.len())
    }

    /// Rebuild the table without any field bound to `param`; messages left
    /// without fields are dropped. Returns the number of removed fields.
    pub fn remove_param(&mut self, param: ParamId) -> usize {
        let mut rebuilt = MessageTable::new();
        let mut removed = 0;

        for message in self.messages.iter() {
            let mut kept = MessageDefinition::new(message.id);
            for field in message.fields.iter() {
                if field.param == param {
                    removed += 1;
                } else {
                    // A subset of a message always fits.
                    let _ = kept.fields.push(*field);
                }
            }
            if !kept.fields.is_empty() {
                let _ = rebuilt.messages.push(kept);
            }
        }

        *self = rebuilt;
        removed
    }
}

//==================================================================================MAPPING_INFO
/// Flattened view of one mapping, as returned by lookups and iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MappingInfo {
    pub param: ParamId,
    pub id: CanId,
    pub offset_bits: u8,
    pub width_bits: u8,
    pub gain: f32,
    pub translation: i16,
    pub direction: Direction,
}

impl MappingInfo {
    fn new(message: &MessageDefinition, field: &FieldMapping, direction: Direction) -> Self {
        Self {
            param: field.param,
            id: message.id,
            offset_bits: field.offset_bits,
            width_bits: field.width_bits,
            gain: field.gain,
            translation: field.translation,
            direction,
        }
    }
}

//==================================================================================CAN_MAP
/// The pair of message tables owned by one CAN interface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanMap {
    send: MessageTable,
    recv: MessageTable,
}

impl CanMap {
    pub const fn new() -> Self {
        Self {
            send: MessageTable::new(),
            recv: MessageTable::new(),
        }
    }

    /// Assemble a map from two complete tables.
    pub fn from_tables(send: MessageTable, recv: MessageTable) -> Self {
        Self { send, recv }
    }

    pub fn table(&self, direction: Direction) -> &MessageTable {
        match direction {
            Direction::Send => &self.send,
            Direction::Receive => &self.recv,
        }
    }

    fn table_mut(&mut self, direction: Direction) -> &mut MessageTable {
        match direction {
            Direction::Send => &mut self.send,
            Direction::Receive => &mut self.recv,
        }
    }

    /// Empty both tables.
    pub fn clear(&mut self) {
        self.send.clear();
        self.recv.clear();
    }

    /// Validate and add a mapping to the table selected by `direction`.
    ///
    /// Returns the number of active messages in that table.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        direction: Direction,
        param: ParamId,
        id: u32,
        offset_bits: u8,
        width_bits: u8,
        gain: f32,
        translation: i16,
    ) -> Result<usize, MapError> {
        let id = CanId::new(id)?;
        let field = FieldMapping::new(param, offset_bits, width_bits, gain, translation)?;
        self.table_mut(direction).add(id, field)
    }

    /// Remove every mapping of `param` from both tables.
    pub fn remove(&mut self, param: ParamId) -> usize {
        self.send.remove_param(param) + self.recv.remove_param(param)
    }

    /// First mapping of `param`, outbound table first.
    pub fn find_map(&self, param: ParamId) -> Option<MappingInfo> {
        let mut found = None;
        self.try_for_each(|info| {
            if info.param == param {
                found = Some(*info);
                false
            } else {
                true
            }
        });
        found
    }

    /// Visit every active mapping, outbound table first, in slot order.
    pub fn for_each<F: FnMut(&MappingInfo)>(&self, mut visitor: F) {
        self.try_for_each(|info| {
            visitor(info);
            true
        });
    }

    /// Like `for_each`, stopping as soon as the visitor returns `false`.
    fn try_for_each<F: FnMut(&MappingInfo) -> bool>(&self, mut visitor: F) {
        for (table, direction) in [(&self.send, Direction::Send), (&self.recv, Direction::Receive)] {
            for message in table.iter() {
                for field in message.fields() {
                    if !visitor(&MappingInfo::new(message, field, direction)) {
                        return;
                    }
                }
            }
        }
    }
}
