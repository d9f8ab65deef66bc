//! Persisted form of the message map.
//!
//! The image is a fixed sequence of little-endian 32-bit words:
//!
//! ```text
//! [ outbound table | inbound table | checksum ]
//!   TABLE_WORDS      TABLE_WORDS     1 word
//! ```
//!
//! A table is `MAX_MESSAGES` message records of `MESSAGE_WORDS` words each:
//! the CAN identifier (`UNUSED_ID` for a free slot) followed by
//! `MAX_ITEMS_PER_MESSAGE` field records of three words:
//!
//! ```text
//! word 0: unique id (bits 0..16) | translation as u16 (bits 16..32)
//! word 1: gain (IEEE-754 single bits)
//! word 2: offset bits (bits 0..8) | width bits (bits 8..16)
//! ```
//!
//! A width of zero marks a free field slot. Parameters are stored by their
//! stable unique id so an image survives changes of the parameter enumeration.
//! The checksum covers both tables, word by word, in address order.
use crate::config::{MAX_ITEMS_PER_MESSAGE, MAX_MESSAGES};
use crate::error::PersistError;
use crate::protocol::mapping::{CanMap, FieldMapping, MessageDefinition, MessageTable};
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::traits::checksum::Checksum;
use crate::protocol::transport::traits::config_storage::ConfigStorage;
use crate::protocol::transport::traits::param_store::ParamStore;

/// Identifier value of a free message slot.
pub const UNUSED_ID: u32 = 0xFFFF_FFFF;
/// Words per field record.
pub const FIELD_WORDS: usize = 3;
/// Words per message record.
pub const MESSAGE_WORDS: usize = 1 + FIELD_WORDS * MAX_ITEMS_PER_MESSAGE;
/// Words per table.
pub const TABLE_WORDS: usize = MESSAGE_WORDS * MAX_MESSAGES;
/// Word index of the checksum.
pub const CHECKSUM_INDEX: usize = 2 * TABLE_WORDS;
/// Total image size in words.
pub const IMAGE_WORDS: usize = CHECKSUM_INDEX + 1;

//==================================================================================STORED_FIELD
/// Field record with the parameter in unique-id form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredField {
    pub uid: u16,
    pub translation: i16,
    pub gain: f32,
    pub offset_bits: u8,
    pub width_bits: u8,
}

impl StoredField {
    /// Free slot.
    pub const UNUSED: StoredField = StoredField {
        uid: 0,
        translation: 0,
        gain: 0.0,
        offset_bits: 0,
        width_bits: 0,
    };

    pub fn is_used(&self) -> bool {
        self.width_bits > 0
    }

    pub fn to_words(&self) -> [u32; FIELD_WORDS] {
        [
            self.uid as u32 | ((self.translation as u16 as u32) << 16),
            self.gain.to_bits(),
            self.offset_bits as u32 | ((self.width_bits as u32) << 8),
        ]
    }

    pub fn from_words(words: [u32; FIELD_WORDS]) -> Self {
        Self {
            uid: words[0] as u16,
            translation: (words[0] >> 16) as u16 as i16,
            gain: f32::from_bits(words[1]),
            offset_bits: words[2] as u8,
            width_bits: (words[2] >> 8) as u8,
        }
    }
}

//==================================================================================STORED_MESSAGE
/// Message record; `id == UNUSED_ID` marks a free slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoredMessage {
    pub id: u32,
    pub fields: [StoredField; MAX_ITEMS_PER_MESSAGE],
}

impl StoredMessage {
    pub const UNUSED: StoredMessage = StoredMessage {
        id: UNUSED_ID,
        fields: [StoredField::UNUSED; MAX_ITEMS_PER_MESSAGE],
    };

    pub fn is_used(&self) -> bool {
        self.id != UNUSED_ID
    }

    /// Active fields: the slots before the first free one.
    pub fn active_fields(&self) -> impl Iterator<Item = &StoredField> {
        self.fields.iter().take_while(|field| field.is_used())
    }

    /// Word `index` of this record.
    fn word(&self, index: usize) -> u32 {
        match index {
            0 => self.id,
            _ => {
                let field = &self.fields[(index - 1) / FIELD_WORDS];
                field.to_words()[(index - 1) % FIELD_WORDS]
            }
        }
    }
}

//==================================================================================STORED_TABLE
/// Table record: every slot, used or not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoredTable {
    pub messages: [StoredMessage; MAX_MESSAGES],
}

impl Default for StoredTable {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl StoredTable {
    pub const EMPTY: StoredTable = StoredTable {
        messages: [StoredMessage::UNUSED; MAX_MESSAGES],
    };

    /// Active messages: the slots before the first free one.
    pub fn active_messages(&self) -> impl Iterator<Item = &StoredMessage> {
        self.messages.iter().take_while(|message| message.is_used())
    }

    /// Translate an in-memory table into its stored form.
    ///
    /// Fields whose parameter has no unique id cannot be stored and are left
    /// out; the remaining records stay packed.
    pub fn capture<P: ParamStore + ?Sized>(table: &MessageTable, params: &P) -> Self {
        let mut stored = Self::EMPTY;
        let mut slot = 0;

        for message in table.iter() {
            let record = &mut stored.messages[slot];
            let mut field_slot = 0;

            for field in message.fields() {
                let Some(uid) = params.unique_id(field.param) else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Param {} has no unique id, not saved", field.param);
                    continue;
                };
                record.fields[field_slot] = StoredField {
                    uid,
                    translation: field.translation,
                    gain: field.gain,
                    offset_bits: field.offset_bits,
                    width_bits: field.width_bits,
                };
                field_slot += 1;
            }

            if field_slot > 0 {
                record.id = message.id().raw();
                slot += 1;
            }
        }
        stored
    }

    /// Translate back into an in-memory table, resolving unique ids.
    ///
    /// Fields whose unique id is unknown to the store, or whose geometry is
    /// invalid, are dropped; messages left empty are dropped as well.
    pub fn restore<P: ParamStore + ?Sized>(&self, params: &P) -> MessageTable {
        let mut table = MessageTable::new();

        for record in self.active_messages() {
            let Ok(id) = CanId::new(record.id) else {
                continue;
            };
            let mut message = MessageDefinition::new(id);

            for stored in record.active_fields() {
                let Some(param) = params.from_unique_id(stored.uid) else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Unknown unique id {} in stored map, dropped", stored.uid);
                    continue;
                };
                if let Ok(field) = FieldMapping::new(
                    param,
                    stored.offset_bits,
                    stored.width_bits,
                    stored.gain,
                    stored.translation,
                ) {
                    // Record capacity equals message capacity.
                    let _ = message.push_field(field);
                }
            }

            if !message.fields().is_empty() {
                let _ = table.push(message);
            }
        }
        table
    }

    /// Word `index` (0..TABLE_WORDS) of the record.
    pub fn word(&self, index: usize) -> u32 {
        self.messages[index / MESSAGE_WORDS].word(index % MESSAGE_WORDS)
    }

    /// Rebuild a table record from its words.
    pub fn from_words<E>(mut next_word: impl FnMut() -> Result<u32, E>) -> Result<Self, E> {
        let mut table = Self::EMPTY;
        for message in table.messages.iter_mut() {
            message.id = next_word()?;
            for field in message.fields.iter_mut() {
                *field = StoredField::from_words([next_word()?, next_word()?, next_word()?]);
            }
        }
        Ok(table)
    }
}

//==================================================================================PERSISTED_IMAGE
/// Both tables in stored form plus the checksum guarding them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PersistedImage {
    pub send: StoredTable,
    pub recv: StoredTable,
    pub checksum: u32,
}

impl PersistedImage {
    /// Capture `map`; the checksum is filled in by [`PersistedImage::write`].
    pub fn capture<P: ParamStore + ?Sized>(map: &CanMap, params: &P) -> Self {
        Self {
            send: StoredTable::capture(map.table(crate::core::Direction::Send), params),
            recv: StoredTable::capture(map.table(crate::core::Direction::Receive), params),
            checksum: 0,
        }
    }

    /// Resolve unique ids back into an in-memory map.
    pub fn restore<P: ParamStore + ?Sized>(&self, params: &P) -> CanMap {
        CanMap::from_tables(self.send.restore(params), self.recv.restore(params))
    }

    /// Table words in storage order (outbound then inbound).
    pub fn table_words(&self) -> impl Iterator<Item = u32> + '_ {
        (0..TABLE_WORDS)
            .map(|index| self.send.word(index))
            .chain((0..TABLE_WORDS).map(|index| self.recv.word(index)))
    }

    /// Erase the region, program both tables then the checksum.
    ///
    /// Returns the checksum written.
    pub fn write<S: ConfigStorage, K: Checksum>(
        &mut self,
        storage: &mut S,
        checksum: &mut K,
    ) -> Result<u32, PersistError<S::Error>> {
        storage.erase().map_err(PersistError::Storage)?;
        checksum.reset();

        let mut crc = 0;
        for (index, word) in self.table_words().enumerate() {
            crc = checksum.accumulate(word);
            storage
                .program_word(index, word)
                .map_err(PersistError::Storage)?;
        }
        storage
            .program_word(CHECKSUM_INDEX, crc)
            .map_err(PersistError::Storage)?;

        self.checksum = crc;
        Ok(crc)
    }

    /// Read and verify an image. Nothing is returned unless the stored
    /// checksum matches the stored tables.
    pub fn read<S: ConfigStorage, K: Checksum>(
        storage: &mut S,
        checksum: &mut K,
    ) -> Result<Self, PersistError<S::Error>> {
        checksum.reset();

        let mut index = 0;
        let mut crc = 0;
        let mut next_word = || -> Result<u32, S::Error> {
            let word = storage.read_word(index)?;
            crc = checksum.accumulate(word);
            index += 1;
            Ok(word)
        };

        let send = StoredTable::from_words(&mut next_word).map_err(PersistError::Storage)?;
        let recv = StoredTable::from_words(&mut next_word).map_err(PersistError::Storage)?;

        let stored = storage
            .read_word(CHECKSUM_INDEX)
            .map_err(PersistError::Storage)?;
        if stored != crc {
            return Err(PersistError::ChecksumMismatch {
                stored,
                computed: crc,
            });
        }

        Ok(Self {
            send,
            recv,
            checksum: stored,
        })
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
