//! Graph operations
//!
//! Mutations always run inside a transaction: the caller's when one is
//! supplied, otherwise an internal one that commits before returning, so
//! both endpoints of an edge change together or not at all.

use std::collections::{BTreeMap, BTreeSet};

use manifold_arena::Arena;
use manifold_common::{
    CollectionId, Key, Options, Places, Result, Strided, DEGREE_MISSING,
};
use manifold_store::{session, Database, ReadShape, Transaction};

use crate::adjacency::{decode_list, encode_list, insert_record, remove_record, AdjRecord};
use crate::edges::{Edge, Edges, Role};

fn with_session<F>(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    options: Options,
    mutate: F,
) -> Result<()>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<()>,
{
    match txn {
        Some(txn) => mutate(txn),
        None => {
            let mut own = db.begin_transaction();
            mutate(&mut own)?;
            own.commit(options)
        }
    }
}

fn load_records(
    txn: &mut Transaction<'_>,
    collection: CollectionId,
    vertex: Key,
    arena: &Arena,
) -> Result<Option<Vec<AdjRecord>>> {
    match txn.get(collection, vertex, arena)? {
        None => Ok(None),
        Some(bytes) => decode_list(bytes).map(Some),
    }
}

/// The two records one edge contributes, keyed by owning vertex.
fn records_of(edge: Edge) -> [(Key, AdjRecord); 2] {
    [
        (
            edge.source,
            AdjRecord {
                neighbor: edge.target,
                edge_id: edge.id,
                outgoing: true,
            },
        ),
        (
            edge.target,
            AdjRecord {
                neighbor: edge.source,
                edge_id: edge.id,
                outgoing: false,
            },
        ),
    ]
}

/// Add edges to the adjacency index; identical triples are idempotent.
pub fn upsert_edges(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    collection: CollectionId,
    edges: &Edges<'_>,
    options: Options,
    arena: &Arena,
) -> Result<()> {
    edges.validate()?;

    let mut additions: BTreeMap<Key, Vec<AdjRecord>> = BTreeMap::new();
    for edge in edges.iter() {
        for (vertex, record) in records_of(edge) {
            additions.entry(vertex).or_default().push(record);
        }
    }

    with_session(db, txn, options, |txn| {
        for (vertex, records) in additions {
            let mut list = load_records(txn, collection, vertex, arena)?.unwrap_or_default();
            for record in records {
                insert_record(&mut list, record);
            }
            txn.put(collection, vertex, &encode_list(&list))?;
        }
        Ok(())
    })
}

/// Remove matching triples from both endpoints. Vertices stay in the
/// index even when their last edge goes.
pub fn remove_edges(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    collection: CollectionId,
    edges: &Edges<'_>,
    options: Options,
    arena: &Arena,
) -> Result<()> {
    edges.validate()?;

    let mut removals: BTreeMap<Key, Vec<AdjRecord>> = BTreeMap::new();
    for edge in edges.iter() {
        for (vertex, record) in records_of(edge) {
            removals.entry(vertex).or_default().push(record);
        }
    }

    with_session(db, txn, options, |txn| {
        for (vertex, records) in removals {
            let Some(mut list) = load_records(txn, collection, vertex, arena)? else {
                continue;
            };
            for record in &records {
                remove_record(&mut list, record);
            }
            txn.put(collection, vertex, &encode_list(&list))?;
        }
        Ok(())
    })
}

/// Remove each vertex and all incident edges, patching every neighbor's
/// adjacency list.
pub fn remove_vertices(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    collection: CollectionId,
    vertices: Strided<'_, Key>,
    count: usize,
    options: Options,
    arena: &Arena,
) -> Result<()> {
    vertices.check(count)?;
    let removed: BTreeSet<Key> = (0..count).map(|index| *vertices.get(index)).collect();

    with_session(db, txn, options, |txn| {
        let mut neighbors_to_patch: BTreeSet<Key> = BTreeSet::new();
        for &vertex in &removed {
            if let Some(list) = load_records(txn, collection, vertex, arena)? {
                for record in &list {
                    if !removed.contains(&record.neighbor) {
                        neighbors_to_patch.insert(record.neighbor);
                    }
                }
            }
            txn.erase(collection, vertex)?;
        }

        for &neighbor in &neighbors_to_patch {
            let Some(mut list) = load_records(txn, collection, neighbor, arena)? else {
                continue;
            };
            list.retain(|record| !removed.contains(&record.neighbor));
            txn.put(collection, neighbor, &encode_list(&list))?;
        }
        Ok(())
    })
}

/// Per-vertex degrees and packed adjacent edge triples.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhoods<'a> {
    /// One entry per queried vertex; `DEGREE_MISSING` for absent vertices.
    pub degrees: &'a [u32],
    /// Per-vertex start offsets into the edge arrays, `vertices + 1`
    /// entries.
    pub offsets: &'a [u32],
    pub sources: &'a [Key],
    pub targets: &'a [Key],
    pub edge_ids: &'a [Key],
}

impl<'a> Neighborhoods<'a> {
    pub fn degree(&self, index: usize) -> u32 {
        self.degrees[index]
    }

    /// Edges adjacent to one queried vertex.
    pub fn task_edges(&self, index: usize) -> impl Iterator<Item = Edge> + 'a {
        let start = self.offsets[index] as usize;
        let end = self.offsets[index + 1] as usize;
        let (sources, targets, edge_ids) = (self.sources, self.targets, self.edge_ids);
        (start..end).map(move |slot| Edge {
            source: sources[slot],
            target: targets[slot],
            id: edge_ids[slot],
        })
    }
}

/// Enumerate each vertex's neighborhood in the requested role.
pub fn find_edges<'a>(
    db: &Database,
    txn: Option<&mut Transaction<'_>>,
    collection: CollectionId,
    vertices: Strided<'_, Key>,
    count: usize,
    role: Role,
    options: Options,
    arena: &'a Arena,
) -> Result<Neighborhoods<'a>> {
    vertices.check(count)?;

    let places = Places {
        collections: Strided::Repeated(&collection),
        keys: vertices,
        count,
    };
    let fetched = session::read(db, txn, &places, options, ReadShape::Full, arena)?;

    let degrees = arena.alloc_slice::<u32>(count)?;
    let offsets = arena.alloc_slice::<u32>(count + 1)?;
    let mut sources: Vec<Key> = Vec::new();
    let mut targets: Vec<Key> = Vec::new();
    let mut edge_ids: Vec<Key> = Vec::new();

    for index in 0..count {
        offsets[index] = sources.len() as u32;
        let vertex = *vertices.get(index);
        let Some(bytes) = fetched.get(index) else {
            degrees[index] = DEGREE_MISSING;
            continue;
        };

        let mut degree = 0u32;
        for record in decode_list(bytes)? {
            let matches = match role {
                Role::Source => record.outgoing,
                Role::Target => !record.outgoing,
                Role::Any => true,
            };
            if !matches {
                continue;
            }
            degree += 1;
            if record.outgoing {
                sources.push(vertex);
                targets.push(record.neighbor);
            } else {
                sources.push(record.neighbor);
                targets.push(vertex);
            }
            edge_ids.push(record.edge_id);
        }
        degrees[index] = degree;
    }
    offsets[count] = sources.len() as u32;

    Ok(Neighborhoods {
        degrees,
        offsets,
        sources: arena.alloc_copy(&sources)?,
        targets: arena.alloc_copy(&targets)?,
        edge_ids: arena.alloc_copy(&edge_ids)?,
    })
}
