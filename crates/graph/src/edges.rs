//! Edge batch views

use manifold_common::{Key, Result, Strided, DEFAULT_EDGE_ID};

/// One directed edge. `DEFAULT_EDGE_ID` marks an unlabeled edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub source: Key,
    pub target: Key,
    pub id: Key,
}

impl Edge {
    pub fn new(source: Key, target: Key, id: Key) -> Self {
        Self { source, target, id }
    }

    /// An edge carrying the reserved unlabeled id.
    pub fn unlabeled(source: Key, target: Key) -> Self {
        Self {
            source,
            target,
            id: DEFAULT_EDGE_ID,
        }
    }
}

/// Which side of its edges a queried vertex plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Target,
    Any,
}

/// A batch of edges addressed by one call.
#[derive(Debug, Clone, Copy)]
pub struct Edges<'a> {
    pub sources: Strided<'a, Key>,
    pub targets: Strided<'a, Key>,
    /// `None` marks every edge unlabeled.
    pub edge_ids: Option<Strided<'a, Key>>,
    pub count: usize,
}

impl<'a> Edges<'a> {
    pub fn new(
        sources: impl Into<Strided<'a, Key>>,
        targets: impl Into<Strided<'a, Key>>,
        count: usize,
    ) -> Self {
        Self {
            sources: sources.into(),
            targets: targets.into(),
            edge_ids: None,
            count,
        }
    }

    pub fn with_ids(mut self, edge_ids: impl Into<Strided<'a, Key>>) -> Self {
        self.edge_ids = Some(edge_ids.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.sources.check(self.count)?;
        self.targets.check(self.count)?;
        if let Some(edge_ids) = &self.edge_ids {
            edge_ids.check(self.count)?;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Edge {
        Edge {
            source: *self.sources.get(index),
            target: *self.targets.get(index),
            id: self
                .edge_ids
                .as_ref()
                .map(|ids| *ids.get(index))
                .unwrap_or(DEFAULT_EDGE_ID),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.count).map(|index| self.get(index))
    }
}
