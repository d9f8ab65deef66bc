//! Non-volatile region holding one interface's persisted mapping.

/// Word-addressed flash region with an explicit erase-then-program contract.
///
/// Indices are relative to the start of the region reserved for this
/// interface; the implementation owns the physical base address.
pub trait ConfigStorage {
    type Error: core::fmt::Debug;

    /// Erase the whole region so that every word can be programmed once.
    fn erase(&mut self) -> Result<(), Self::Error>;

    /// Program the word at `index`. The region must have been erased.
    fn program_word(&mut self, index: usize, value: u32) -> Result<(), Self::Error>;

    /// Read back the word at `index`.
    fn read_word(&mut self, index: usize) -> Result<u32, Self::Error>;
}
