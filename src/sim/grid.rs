//! Uniform-bucket spatial index
//!
//! Rebuilt from scratch every tick. Covers the padded world rectangle; the
//! parts of a box outside it are simply not indexed (such entities are about
//! to be culled anyway).

use glam::Vec2;

use super::entity::{Aabb, Entity, Kind};
use super::store::{EntityStore, Handle};
use crate::consts::{CULL_PADDING, GRID_CELL_SIZE, WORLD_HEIGHT, WORLD_WIDTH};

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    origin: Vec2,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<Handle>>,
}

/// Inclusive cell index range a box covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub col_min: usize,
    pub col_max: usize,
    pub row_min: usize,
    pub row_max: usize,
}

impl CellRange {
    pub fn intersects(&self, other: &CellRange) -> bool {
        self.col_min <= other.col_max
            && other.col_min <= self.col_max
            && self.row_min <= other.row_max
            && other.row_min <= self.row_max
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}

impl SpatialGrid {
    /// Grid over the world plus the culling margin on every side
    pub fn new(cell_size: f32) -> Self {
        let origin = Vec2::splat(-CULL_PADDING);
        let extent = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT) + Vec2::splat(2.0 * CULL_PADDING);
        let cols = (extent.x / cell_size).ceil() as usize;
        let rows = (extent.y / cell_size).ceil() as usize;
        Self {
            cell_size,
            origin,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cells a box overlaps, or `None` if it lies entirely outside the grid
    pub fn cell_range(&self, bounds: &Aabb) -> Option<CellRange> {
        let lo = (bounds.min - self.origin) / self.cell_size;
        let hi = (bounds.max() - self.origin) / self.cell_size;
        if hi.x < 0.0 || hi.y < 0.0 || lo.x >= self.cols as f32 || lo.y >= self.rows as f32 {
            return None;
        }
        let clamp_col = |v: f32| (v.max(0.0) as usize).min(self.cols - 1);
        let clamp_row = |v: f32| (v.max(0.0) as usize).min(self.rows - 1);
        Some(CellRange {
            col_min: clamp_col(lo.x.floor()),
            col_max: clamp_col(hi.x.floor()),
            row_min: clamp_row(lo.y.floor()),
            row_max: clamp_row(hi.y.floor()),
        })
    }

    fn cell_indices(&self, range: CellRange) -> impl Iterator<Item = usize> + '_ {
        (range.row_min..=range.row_max)
            .flat_map(move |row| (range.col_min..=range.col_max).map(move |col| row * self.cols + col))
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Index one entity into every cell its box overlaps
    pub fn insert(&mut self, handle: Handle, bounds: &Aabb) {
        let Some(range) = self.cell_range(bounds) else {
            return;
        };
        let indices: Vec<usize> = self.cell_indices(range).collect();
        for i in indices {
            self.cells[i].push(handle);
        }
    }

    /// Clear and re-insert every collidable entity in the store
    pub fn rebuild(&mut self, store: &EntityStore) {
        self.clear();
        for kind in Kind::ALL {
            for handle in store.handles(kind) {
                if let Some(entity) = store.get(handle).filter(|e| e.collidable()) {
                    self.insert(handle, &entity.bounds());
                }
            }
        }
    }

    /// Deduplicated candidates sharing at least one cell with `entity`,
    /// excluding the entity itself. Sorted by id.
    pub fn query(&self, entity: &Entity) -> Vec<Handle> {
        let Some(range) = self.cell_range(&entity.bounds()) else {
            return Vec::new();
        };
        let mut out: Vec<Handle> = self
            .cell_indices(range)
            .flat_map(|i| self.cells[i].iter().copied())
            .filter(|h| h.id != entity.id)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of (handle, cell) entries, for diagnostics
    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}
