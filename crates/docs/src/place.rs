//! Batched document addresses

use manifold_common::{CollectionId, Key, Places, Result, Strided};

/// A batch of `(collection, key[, field])` addresses. The empty field
/// addresses the whole document.
#[derive(Debug, Clone, Copy)]
pub struct DocPlaces<'a> {
    pub collections: Strided<'a, CollectionId>,
    pub keys: Strided<'a, Key>,
    /// Per-task field; `None` or an empty element addresses document roots.
    pub fields: Option<Strided<'a, &'a str>>,
    pub count: usize,
}

impl<'a> DocPlaces<'a> {
    pub fn new(
        collections: impl Into<Strided<'a, CollectionId>>,
        keys: impl Into<Strided<'a, Key>>,
        count: usize,
    ) -> Self {
        Self {
            collections: collections.into(),
            keys: keys.into(),
            fields: None,
            count,
        }
    }

    /// Whole documents of `keys` within one collection.
    pub fn in_collection(collection: &'a CollectionId, keys: &'a [Key]) -> Self {
        Self {
            collections: Strided::Repeated(collection),
            keys: Strided::Slice(keys),
            fields: None,
            count: keys.len(),
        }
    }

    pub fn with_fields(mut self, fields: impl Into<Strided<'a, &'a str>>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.collections.check(self.count)?;
        self.keys.check(self.count)?;
        if let Some(fields) = &self.fields {
            fields.check(self.count)?;
        }
        Ok(())
    }

    /// Field of one task, `None` when the task addresses the root.
    pub fn field(&self, index: usize) -> Option<&'a str> {
        let field = *self.fields.as_ref()?.get(index);
        if field.is_empty() {
            None
        } else {
            Some(field)
        }
    }

    /// Whether any task addresses a sub-field.
    pub fn has_fields(&self) -> bool {
        (0..self.count).any(|index| self.field(index).is_some())
    }

    /// The underlying blob places.
    pub fn blob_places(&self) -> Places<'a> {
        Places {
            collections: self.collections,
            keys: self.keys,
            count: self.count,
        }
    }
}
