//! Options bitset accepted by every batched call

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Per-call behavior flags. Unknown bits are rejected at the boundary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u32 {
        /// Force fsync on write; disables the write-ahead-log shortcut.
        const WRITE_FLUSH = 1 << 0;
        /// Do not enroll this read into the transaction's conflict set.
        const TXN_DONT_WATCH = 1 << 1;
        /// Advisory: outputs may reference shared memory.
        const READ_SHARED_MEMORY = 1 << 2;
        /// Advisory: the scan is part of a bulk export.
        const SCAN_BULK = 1 << 3;
    }
}

impl Options {
    /// Construct from raw bits, rejecting any unknown bit.
    pub fn from_raw(bits: u32) -> Result<Self> {
        Self::from_bits(bits).ok_or(Error::ArgsWrong("unknown option bits"))
    }

    /// Whether transactional reads should be tracked for conflict detection.
    #[inline]
    pub fn watch(self) -> bool {
        !self.contains(Options::TXN_DONT_WATCH)
    }

    /// Whether writes must be flushed to disk before returning.
    #[inline]
    pub fn flush(self) -> bool {
        self.contains(Options::WRITE_FLUSH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bits_round_trip() {
        let options = Options::WRITE_FLUSH | Options::SCAN_BULK;
        assert_eq!(Options::from_raw(options.bits()).unwrap(), options);
    }

    #[test]
    fn unknown_bits_are_rejected() {
        assert!(Options::from_raw(1 << 17).is_err());
    }

    #[test]
    fn watch_is_the_default() {
        assert!(Options::empty().watch());
        assert!(!Options::TXN_DONT_WATCH.watch());
    }
}
