//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (mapping table updates,
//! persisted configuration, parameter store access, remote SDO requests).
use thiserror_no_std::Error;

//==================================================================================MAP_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors returned synchronously when editing the message tables.
pub enum MapError {
    /// Identifier does not fit in 29 bits.
    #[error("Invalid CAN identifier")]
    InvalidId,
    /// Bit offset is beyond the 64 payload bits.
    #[error("Invalid bit offset")]
    InvalidOffset,
    /// Bit width is zero or larger than 32.
    #[error("Invalid bit length")]
    InvalidLength,
    /// Every message slot of the table is in use.
    #[error("Maximum number of messages reached")]
    MaxMessages,
    /// Every field slot of the message is in use.
    #[error("Maximum number of items in message reached")]
    MaxItems,
    /// No room left in the passthrough identifier list.
    #[error("User message list is full")]
    UserListFull,
}

impl MapError {
    /// Legacy numeric code (`-1` .. `-6`) used by configuration front-ends.
    pub fn code(self) -> i32 {
        match self {
            MapError::InvalidId => -1,
            MapError::InvalidOffset => -2,
            MapError::InvalidLength => -3,
            MapError::MaxMessages => -4,
            MapError::MaxItems => -5,
            MapError::UserListFull => -6,
        }
    }
}

//==================================================================================PARAM_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures reported by a parameter store when setting a value.
pub enum ParamError {
    /// The parameter reference is not known to the store.
    #[error("Unknown parameter")]
    Unknown,
    /// The value lies outside the parameter's allowed range.
    #[error("Value out of range")]
    OutOfRange,
}

//==================================================================================PERSIST_ERROR
#[derive(Error, Debug)]
/// Errors raised while saving or loading the mapping configuration.
pub enum PersistError<E: core::fmt::Debug> {
    /// The non-volatile storage primitive failed.
    #[error("Storage error: {0:?}")]
    Storage(E),
    /// The stored checksum does not match the stored tables.
    #[error("Checksum mismatch -> stored: {stored:#010x}, computed: {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

//==================================================================================SDO_ABORT
/// Abort codes carried in the data word of an SDO abort reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum SdoAbortCode {
    /// Object does not exist in the object dictionary.
    InvalidIndex = 0x0602_0000,
    /// Value range of parameter exceeded.
    Range = 0x0609_0030,
}

impl SdoAbortCode {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
