//! Word-wise checksum unit guarding the persisted image, plus a software
//! implementation compatible with the STM32 CRC peripheral.

/// Incremental 32-bit checksum fed one word at a time.
pub trait Checksum {
    /// Restart from the initial value.
    fn reset(&mut self);

    /// Feed `word` and return the running checksum.
    fn accumulate(&mut self, word: u32) -> u32;
}

/// Software CRC-32/MPEG-2 (polynomial 0x04C11DB7, init 0xFFFF_FFFF, no
/// reflection, no final XOR) processed one whole word at a time, MSB first.
/// Produces the same values as the STM32 hardware CRC unit.
#[derive(Clone, Copy, Debug)]
pub struct StmCrc32 {
    value: u32,
}

impl StmCrc32 {
    const POLY: u32 = 0x04C1_1DB7;
    const INIT: u32 = 0xFFFF_FFFF;

    pub const fn new() -> Self {
        Self { value: Self::INIT }
    }

    /// Current checksum without feeding more data.
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Default for StmCrc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for StmCrc32 {
    fn reset(&mut self) {
        self.value = Self::INIT;
    }

    fn accumulate(&mut self, word: u32) -> u32 {
        let mut crc = self.value ^ word;
        for _ in 0..32 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ Self::POLY
            } else {
                crc << 1
            };
        }
        self.value = crc;
        crc
    }
}
