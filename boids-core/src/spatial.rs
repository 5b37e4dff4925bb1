use crate::{error::IndexError, types::AgentId};
use glam::Vec3;
use rstar::{RTree, primitives::GeomWithData};

type Entry = GeomWithData<[f32; 3], AgentId>;

/// Dynamic nearest-neighbor index over boid positions.
///
/// The index owns a dense position array keyed by [`AgentId`] and an
/// R*-tree whose entries carry only the id next to the stored point. The
/// dense array is the source of truth for what the tree currently holds,
/// which is what lets [`SpatialIndex::remove`] find the exact tree entry.
///
/// An index is created populated, through [`SpatialIndex::new`].
#[derive(Debug)]
pub struct SpatialIndex {
    positions: Vec<Option<Vec3>>,
    tree: RTree<Entry>,
}

impl SpatialIndex {
    /// Builds an index where `points[i]` is the position of agent `i`.
    ///
    /// ### Parameters
    /// - `points` - Initial positions, one per agent, in id order.
    ///
    /// ### Returns
    /// An index holding ids `0..points.len()`, bulk-loaded in one pass.
    pub fn new(points: &[Vec3]) -> Self {
        let positions = points.iter().copied().map(Some).collect();
        let entries = points
            .iter()
            .enumerate()
            .map(|(id, p)| Entry::new(p.to_array(), id))
            .collect();

        Self {
            positions,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Discards every entry and bulk-loads `points` from scratch.
    pub fn rebuild(&mut self, points: &[Vec3]) {
        *self = Self::new(points);
    }

    /// Number of agents currently indexed.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Position stored for `id`, or `None` if it is not indexed.
    pub fn position(&self, id: AgentId) -> Option<Vec3> {
        self.positions.get(id).copied().flatten()
    }

    /// Adds `id` at `pos`.
    ///
    /// Ids need not be contiguous; the position array grows as needed.
    ///
    /// ### Parameters
    /// - `id` - Agent to add.
    /// - `pos` - Its position.
    ///
    /// ### Errors
    /// [`IndexError::DuplicateId`] if `id` is already indexed.
    pub fn insert(&mut self, id: AgentId, pos: Vec3) -> Result<(), IndexError> {
        if self.position(id).is_some() {
            return Err(IndexError::DuplicateId(id));
        }
        if id >= self.positions.len() {
            self.positions.resize(id + 1, None);
        }
        self.positions[id] = Some(pos);
        self.tree.insert(Entry::new(pos.to_array(), id));
        Ok(())
    }

    /// Removes the entry for `id` and returns the position it held.
    ///
    /// ### Errors
    /// [`IndexError::UnknownId`] if `id` is not indexed.
    pub fn remove(&mut self, id: AgentId) -> Result<Vec3, IndexError> {
        let pos = self.position(id).ok_or(IndexError::UnknownId(id))?;
        self.tree
            .remove(&Entry::new(pos.to_array(), id))
            .ok_or(IndexError::UnknownId(id))?;
        self.positions[id] = None;
        Ok(pos)
    }

    /// Moves `id` to `pos` (remove followed by insert).
    ///
    /// ### Errors
    /// [`IndexError::UnknownId`] if `id` is not indexed.
    pub fn update(&mut self, id: AgentId, pos: Vec3) -> Result<(), IndexError> {
        self.remove(id)?;
        self.insert(id, pos)
    }

    /// Returns up to `k` neighbors of `id` strictly closer than `radius`.
    ///
    /// Neighbors are ordered by ascending distance, with ties broken by
    /// ascending id, and `id` itself is never part of the result. A `k`
    /// of zero or a radius that is not positive yields an empty result.
    ///
    /// ### Parameters
    /// - `id` - Querying agent.
    /// - `k` - Maximum number of neighbors returned.
    /// - `radius` - Exclusive distance cutoff.
    ///
    /// ### Returns
    /// Neighbor ids, nearest first.
    ///
    /// ### Errors
    /// [`IndexError::UnknownId`] if `id` has no entry in the index.
    pub fn query(&self, id: AgentId, k: usize, radius: f32) -> Result<Vec<AgentId>, IndexError> {
        let center = self.position(id).ok_or(IndexError::UnknownId(id))?;
        if k == 0 || !(radius > 0.0) {
            return Ok(Vec::new());
        }

        let r2 = radius * radius;
        let mut found: Vec<(f32, AgentId)> = self
            .tree
            .locate_within_distance(center.to_array(), r2)
            .filter(|e| e.data != id)
            .map(|e| (center.distance_squared(Vec3::from_array(*e.geom())), e.data))
            .filter(|&(d2, _)| d2 < r2)
            .collect();

        found.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.truncate(k);

        Ok(found.into_iter().map(|(_, other)| other).collect())
    }
}
