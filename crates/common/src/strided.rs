//! Strided batch views
//!
//! Batched calls accept one element per task either from a contiguous slice
//! or from a single broadcast element (the stride-0 case of the C boundary).
//! Validation happens once at the boundary; indexing afterwards is
//! infallible.

use crate::error::{Error, Result};
use crate::reserved::{CollectionId, Key};

/// A view over one logical array of task inputs.
#[derive(Debug, Clone, Copy)]
pub enum Strided<'a, T> {
    /// One element applied to every task.
    Repeated(&'a T),
    /// One element per task.
    Slice(&'a [T]),
}

impl<'a, T> Strided<'a, T> {
    /// Element for task `index`. Callers must have validated the view
    /// against the task count first.
    #[inline]
    pub fn get(&self, index: usize) -> &'a T {
        match self {
            Strided::Repeated(value) => value,
            Strided::Slice(values) => &values[index],
        }
    }

    /// Check that the view covers `count` tasks.
    pub fn check(&self, count: usize) -> Result<()> {
        match self {
            Strided::Repeated(_) => Ok(()),
            Strided::Slice(values) if values.len() == count => Ok(()),
            Strided::Slice(_) => Err(Error::ArgsWrong("batch array length does not match task count")),
        }
    }
}

impl<'a, T> From<&'a T> for Strided<'a, T> {
    fn from(value: &'a T) -> Self {
        Strided::Repeated(value)
    }
}

impl<'a, T> From<&'a [T]> for Strided<'a, T> {
    fn from(values: &'a [T]) -> Self {
        Strided::Slice(values)
    }
}

/// One resolved `(collection, key)` address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Place {
    pub collection: CollectionId,
    pub key: Key,
}

/// A batch of places addressed by one call.
#[derive(Debug, Clone, Copy)]
pub struct Places<'a> {
    pub collections: Strided<'a, CollectionId>,
    pub keys: Strided<'a, Key>,
    pub count: usize,
}

impl<'a> Places<'a> {
    pub fn new(
        collections: impl Into<Strided<'a, CollectionId>>,
        keys: impl Into<Strided<'a, Key>>,
        count: usize,
    ) -> Self {
        Self {
            collections: collections.into(),
            keys: keys.into(),
            count,
        }
    }

    /// All `keys` within a single collection.
    pub fn in_collection(collection: &'a CollectionId, keys: &'a [Key]) -> Self {
        Self {
            collections: Strided::Repeated(collection),
            keys: Strided::Slice(keys),
            count: keys.len(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.collections.check(self.count)?;
        self.keys.check(self.count)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Place {
        Place {
            collection: *self.collections.get(index),
            key: *self.keys.get(index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Place> + '_ {
        (0..self.count).map(|index| self.get(index))
    }
}
