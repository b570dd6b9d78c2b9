//! Batched point reads
//!
//! Presence, lengths and contents are pulled in one pass since the store
//! round-trip dominates. Missing entries are a normal outcome: presence
//! bit cleared, length set to the missing sentinel.

use manifold_arena::{Arena, TapeBuilder};
use manifold_common::{
    get_bit, octets_for, set_bit, Options, Places, Result, LENGTH_MISSING,
};

use crate::database::Database;
use crate::txn::{Fetched, Transaction};

/// Which outputs a read materializes. Skipping the contents tape saves
/// the value copies when only presence or lengths are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadShape {
    /// Presence bits only.
    Presences,
    /// Presence bits and lengths.
    Lengths,
    /// Presence bits, lengths, offsets and the contents tape.
    Full,
}

/// Arena-owned outputs of one batched read.
#[derive(Debug, Clone, Copy)]
pub struct ReadResult<'a> {
    /// Bit-packed presence flags, one per place.
    pub presences: &'a [u8],
    /// Per-place value lengths; `LENGTH_MISSING` marks absent entries.
    /// Empty unless lengths were requested.
    pub lengths: &'a [u32],
    /// Per-place offsets into `contents`, `places + 1` entries. Empty
    /// unless contents were requested.
    pub offsets: &'a [u32],
    /// Concatenated value bytes.
    pub contents: &'a [u8],
}

impl<'a> ReadResult<'a> {
    #[inline]
    pub fn present(&self, index: usize) -> bool {
        get_bit(self.presences, index)
    }

    /// Value bytes of one place; requires a `Full` read.
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        if !self.present(index) {
            return None;
        }
        let start = self.offsets[index] as usize;
        let length = self.lengths[index] as usize;
        Some(&self.contents[start..start + length])
    }
}

pub(crate) fn read_places<'a>(
    db: &Database,
    mut txn: Option<&mut Transaction<'_>>,
    places: &Places<'_>,
    options: Options,
    shape: ReadShape,
    arena: &'a Arena,
) -> Result<ReadResult<'a>> {
    places.validate()?;

    let count = places.count;
    let presences = arena.alloc_slice::<u8>(octets_for(count))?;
    let wants_lengths = shape != ReadShape::Presences;
    let wants_contents = shape == ReadShape::Full;
    let lengths = arena.alloc_slice::<u32>(if wants_lengths { count } else { 0 })?;
    let mut tape = TapeBuilder::new();
    if wants_contents {
        tape.reserve(count);
    }

    let watch = options.watch();
    for index in 0..count {
        let place = places.get(index);
        let fetched = match txn.as_deref_mut() {
            Some(txn) => txn.fetch(place, watch)?,
            None => match db.committed_get(place)? {
                Some(value) => Fetched::Committed(value),
                None => Fetched::Absent,
            },
        };

        match fetched.as_bytes() {
            Some(bytes) => {
                set_bit(presences, index, true);
                if wants_lengths {
                    lengths[index] = bytes.len() as u32;
                }
                if wants_contents {
                    tape.push(bytes);
                }
            }
            None => {
                if wants_lengths {
                    lengths[index] = LENGTH_MISSING;
                }
                if wants_contents {
                    tape.push_missing();
                }
            }
        }
    }

    let (offsets, contents) = if wants_contents {
        let published = tape.finish(arena)?;
        (published.offsets, published.contents)
    } else {
        (&[][..], &[][..])
    };

    Ok(ReadResult {
        presences,
        lengths,
        offsets,
        contents,
    })
}
