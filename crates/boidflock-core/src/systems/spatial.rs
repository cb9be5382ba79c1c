//! Neighbor lookup over published agent snapshots.
//!
//! Agents never read each other directly. At the start of each tick the
//! engine publishes one [`AgentSnapshot`] per agent and rebuilds a
//! [`SpatialGrid`] over them; neighbor queries return indices into that
//! snapshot table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::{AgentId, Vec3};

const MIN_CELL_SIZE: f32 = 1.0e-3;
const INVALID_INDEX: usize = usize::MAX;
const MAX_CELLS_PER_QUERY: u64 = 4096;
/// Cells on either side of the query cell; larger radii scan every entry.
const MAX_REACH: i64 = 1 << 20;

/// Bit flags tagging what an indexed entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    pub const AGENT: Self = Self(1);
    pub const OBSTACLE: Self = Self(1 << 1);
    pub const ALL: Self = Self(u32::MAX);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for CategoryMask {
    fn default() -> Self {
        Self::AGENT
    }
}

impl std::ops::BitOr for CategoryMask {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Public, read-only view of one agent for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec3,
    pub forward: Vec3,
    pub stuck: bool,
    pub category: CategoryMask,
}

/// Spatial overlap query collaborator.
pub trait NeighborQuery {
    /// Push the index of every entry within `radius` of `position` whose
    /// category intersects `filter`. `out` is not cleared.
    fn query(&self, position: Vec3, radius: f32, filter: CategoryMask, out: &mut Vec<usize>);
}

/// Brute-force scan over a snapshot slice. Fine for small flocks and tests.
pub struct LinearScan<'a> {
    pub snapshots: &'a [AgentSnapshot],
}

impl NeighborQuery for LinearScan<'_> {
    fn query(&self, position: Vec3, radius: f32, filter: CategoryMask, out: &mut Vec<usize>) {
        let radius_sq = radius.max(0.0) * radius.max(0.0);
        for (i, s) in self.snapshots.iter().enumerate() {
            if s.category.intersects(filter) && s.position.distance_squared(&position) <= radius_sq
            {
                out.push(i);
            }
        }
    }
}

type Cell = (i32, i32, i32);

/// Uniform hash grid with per-cell linked lists, rebuilt every tick.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    heads: HashMap<Cell, usize>,
    next: Vec<usize>,
    positions: Vec<Vec3>,
    categories: Vec<CategoryMask>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: sanitize_cell_size(cell_size),
            heads: HashMap::new(),
            next: Vec::new(),
            positions: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Takes effect on the next [`SpatialGrid::rebuild`].
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = sanitize_cell_size(cell_size);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Replace the indexed entries. Entry `i` is reported as index `i`.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Vec3, CategoryMask)>,
    {
        self.heads.clear();
        self.next.clear();
        self.positions.clear();
        self.categories.clear();

        for (i, (position, category)) in entries.into_iter().enumerate() {
            let cell = self.cell_of(position);
            let head = self.heads.entry(cell).or_insert(INVALID_INDEX);
            self.next.push(*head);
            *head = i;
            self.positions.push(position);
            self.categories.push(category);
        }
    }

    /// Convenience rebuild from snapshots.
    pub fn rebuild_from_snapshots(&mut self, snapshots: &[AgentSnapshot]) {
        self.rebuild(snapshots.iter().map(|s| (s.position, s.category)));
    }

    fn cell_of(&self, position: Vec3) -> Cell {
        (
            axis_cell(position.x, self.cell_size),
            axis_cell(position.y, self.cell_size),
            axis_cell(position.z, self.cell_size),
        )
    }

    fn scan_all(&self, position: Vec3, radius_sq: f32, filter: CategoryMask, out: &mut Vec<usize>) {
        for (i, p) in self.positions.iter().enumerate() {
            if self.categories[i].intersects(filter) && p.distance_squared(&position) <= radius_sq {
                out.push(i);
            }
        }
    }
}

impl NeighborQuery for SpatialGrid {
    fn query(&self, position: Vec3, radius: f32, filter: CategoryMask, out: &mut Vec<usize>) {
        if self.positions.is_empty() || !position.is_finite() {
            return;
        }

        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        let reach = ((radius / self.cell_size).ceil() as i64).min(MAX_REACH);
        let span = (2 * reach + 1) as u64;

        // A huge radius touches more cells than there are entries.
        let cells = span.saturating_mul(span).saturating_mul(span);
        if cells > MAX_CELLS_PER_QUERY && cells > self.positions.len() as u64 {
            self.scan_all(position, radius_sq, filter, out);
            return;
        }

        let (cx, cy, cz) = self.cell_of(position);
        let reach = reach as i32;
        for dz in -reach..=reach {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let cell = (cx.wrapping_add(dx), cy.wrapping_add(dy), cz.wrapping_add(dz));
                    let mut candidate = match self.heads.get(&cell) {
                        Some(&head) => head,
                        None => continue,
                    };
                    while candidate != INVALID_INDEX {
                        if self.categories[candidate].intersects(filter)
                            && self.positions[candidate].distance_squared(&position) <= radius_sq
                        {
                            out.push(candidate);
                        }
                        candidate = self.next[candidate];
                    }
                }
            }
        }
    }
}

fn sanitize_cell_size(cell_size: f32) -> f32 {
    if cell_size.is_finite() {
        cell_size.max(MIN_CELL_SIZE)
    } else {
        MIN_CELL_SIZE
    }
}

fn axis_cell(v: f32, cell_size: f32) -> i32 {
    let c = (v / cell_size).floor();
    c.clamp(i32::MIN as f32, i32::MAX as f32) as i32
}
