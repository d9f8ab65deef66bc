//! Compile-time capacities and per-interface runtime configuration.
//!
//! The capacities size every fixed table in the crate and therefore also the
//! persisted image layout. Changing them invalidates stored configurations
//! (the checksum will no longer match and `load` rejects the image).

/// Message slots per table (outbound and inbound each).
pub const MAX_MESSAGES: usize = 10;

/// Field mappings per message.
pub const MAX_ITEMS_PER_MESSAGE: usize = 10;

/// Frames buffered while every hardware transmit mailbox is busy.
pub const SEND_BUFFER_LEN: usize = 20;

/// Identifiers delivered verbatim to the passthrough handler.
pub const MAX_USER_MESSAGES: usize = 10;

/// Identifiers accepted by one hardware filter bank (16-bit list mode).
pub const IDS_PER_BANK: usize = 4;

/// Upper bound on the banks a filter plan can use: control id, user ids and
/// inbound message ids, rounded up to whole banks.
pub const MAX_FILTER_BANKS: usize =
    (1 + MAX_USER_MESSAGES + MAX_MESSAGES + IDS_PER_BANK - 1) / IDS_PER_BANK;

/// Base identifier of incoming SDO requests (`base + node id`).
pub const SDO_REQUEST_BASE: u32 = 0x600;

/// Base identifier of outgoing SDO replies (`base + node id`).
pub const SDO_REPLY_BASE: u32 = 0x580;

/// Largest valid (29-bit) CAN identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Largest 11-bit identifier; anything above is sent as an extended frame.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

//==================================================================================CAN_CONFIG
/// Runtime settings of one CAN interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanConfig {
    /// Local node id used to derive the SDO request/reply identifiers.
    pub node_id: u8,
    /// Base of the SDO request identifier.
    pub request_base: u32,
    /// Base of the SDO reply identifier.
    pub reply_base: u32,
    /// First hardware filter bank owned by this interface.
    pub filter_bank_base: usize,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CanConfig {
    pub const fn new() -> Self {
        Self {
            node_id: 1,
            request_base: SDO_REQUEST_BASE,
            reply_base: SDO_REPLY_BASE,
            filter_bank_base: 0,
        }
    }

    /// Sets the local node id.
    pub const fn with_node_id(mut self, node_id: u8) -> Self {
        self.node_id = node_id;
        self
    }

    /// Sets the first filter bank (second interfaces usually start mid-way).
    pub const fn with_filter_bank_base(mut self, base: usize) -> Self {
        self.filter_bank_base = base;
        self
    }

    /// Overrides the SDO request and reply bases.
    pub const fn with_sdo_bases(mut self, request_base: u32, reply_base: u32) -> Self {
        self.request_base = request_base;
        self.reply_base = reply_base;
        self
    }

    /// Identifier this node listens on for SDO requests.
    #[inline]
    pub const fn control_id(&self) -> u32 {
        self.request_base + self.node_id as u32
    }

    /// Identifier this node answers SDO requests with.
    #[inline]
    pub const fn reply_id(&self) -> u32 {
        self.reply_base + self.node_id as u32
    }
}
