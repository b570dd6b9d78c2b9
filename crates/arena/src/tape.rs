//! Tape builder
//!
//! A tape is a packed byte buffer indexed by parallel offsets/lengths
//! arrays: `offsets` carries `count + 1` entries with the final one equal
//! to the total content size, `lengths[i]` is the entry's byte length or
//! the missing sentinel. String tapes may NUL-terminate each entry; the
//! terminator is excluded from lengths but advances offsets.

use manifold_common::{Result, LENGTH_MISSING};

use crate::Arena;

/// Accumulates variable-length entries before publishing them into an arena.
#[derive(Debug, Default)]
pub struct TapeBuilder {
    offsets: Vec<u32>,
    lengths: Vec<u32>,
    contents: Vec<u8>,
    terminate: bool,
}

impl TapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// NUL-terminate every entry (for string tapes).
    pub fn with_terminator() -> Self {
        Self {
            terminate: true,
            ..Self::default()
        }
    }

    pub fn reserve(&mut self, entries: usize) {
        self.offsets.reserve(entries + 1);
        self.lengths.reserve(entries);
    }

    /// Append a present entry.
    pub fn push(&mut self, bytes: &[u8]) {
        self.offsets.push(self.contents.len() as u32);
        self.lengths.push(bytes.len() as u32);
        self.contents.extend_from_slice(bytes);
        if self.terminate {
            self.contents.push(0);
        }
    }

    /// Append a missing entry: no bytes, length sentinel.
    pub fn push_missing(&mut self) {
        self.offsets.push(self.contents.len() as u32);
        self.lengths.push(LENGTH_MISSING);
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Publish the accumulated entries as arena-owned arrays.
    pub fn finish<'a>(&self, arena: &'a Arena) -> Result<Tape<'a>> {
        let mut offsets = Vec::with_capacity(self.offsets.len() + 1);
        offsets.extend_from_slice(&self.offsets);
        offsets.push(self.contents.len() as u32);
        Ok(Tape {
            offsets: arena.alloc_copy(&offsets)?,
            lengths: arena.alloc_copy(&self.lengths)?,
            contents: arena.alloc_bytes(&self.contents)?,
        })
    }
}

/// An arena-owned packed buffer with parallel offsets and lengths.
#[derive(Debug, Clone, Copy)]
pub struct Tape<'a> {
    /// `len() + 1` entries; the last one equals `contents.len()`.
    pub offsets: &'a [u32],
    /// Entry lengths; the missing sentinel marks absent entries.
    pub lengths: &'a [u32],
    pub contents: &'a [u8],
}

impl<'a> Tape<'a> {
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Entry bytes, or `None` when the entry is missing.
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        let length = self.lengths[index];
        if length == LENGTH_MISSING {
            return None;
        }
        let start = self.offsets[index] as usize;
        Some(&self.contents[start..start + length as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_partition_the_contents() {
        let arena = Arena::new();
        let mut builder = TapeBuilder::new();
        builder.push(b"ab");
        builder.push(b"cde");
        let tape = builder.finish(&arena).unwrap();
        assert_eq!(tape.offsets, &[0, 2, 5]);
        assert_eq!(tape.lengths, &[2, 3]);
        assert_eq!(tape.contents, b"abcde");
        assert_eq!(tape.get(1), Some(&b"cde"[..]));
    }

    #[test]
    fn missing_entries_carry_the_sentinel() {
        let arena = Arena::new();
        let mut builder = TapeBuilder::new();
        builder.push(b"x");
        builder.push_missing();
        builder.push(b"y");
        let tape = builder.finish(&arena).unwrap();
        assert_eq!(tape.lengths, &[1, LENGTH_MISSING, 1]);
        assert_eq!(tape.get(1), None);
        assert_eq!(tape.get(2), Some(&b"y"[..]));
    }

    #[test]
    fn terminators_stay_out_of_lengths() {
        let arena = Arena::new();
        let mut builder = TapeBuilder::with_terminator();
        builder.push(b"one");
        builder.push(b"two");
        let tape = builder.finish(&arena).unwrap();
        assert_eq!(tape.lengths, &[3, 3]);
        assert_eq!(tape.offsets, &[0, 4, 8]);
        assert_eq!(tape.contents, b"one\0two\0");
        assert_eq!(tape.get(0), Some(&b"one"[..]));
    }
}
