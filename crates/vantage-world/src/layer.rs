use glam::IVec2;

use crate::geom::{GridRect, Rect};
use crate::object::WorldObject;
use crate::tileset::{TileId, EMPTY_TILE};

/// Dense tile grid anchored at `origin` (tile coordinates of its bottom-left cell).
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    origin: IVec2,
    width: u32,
    height: u32,
    cells: Vec<Option<TileId>>,
}

impl TileLayer {
    pub fn new(name: impl Into<String>, origin: IVec2, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            origin,
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn bounds(&self) -> GridRect {
        GridRect::new(self.origin.x, self.origin.y, self.width, self.height)
    }

    fn index(&self, tile: IVec2) -> Option<usize> {
        if !self.bounds().contains_tile(tile) {
            return None;
        }
        let local = tile - self.origin;
        Some(local.y as usize * self.width as usize + local.x as usize)
    }

    pub fn get(&self, tile: IVec2) -> Option<TileId> {
        self.index(tile).and_then(|i| self.cells[i])
    }

    /// Sets one cell. Returns `false` when `tile` lies outside the layer.
    pub fn set(&mut self, tile: IVec2, value: Option<TileId>) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: Option<TileId>) {
        self.cells.fill(value);
    }

    /// Writes one atlas tile index per cell of `grid` into `out` (row-major,
    /// bottom row first). Empty and out-of-layer cells become [`EMPTY_TILE`].
    ///
    /// `out` is cleared first so callers can reuse the allocation across frames.
    pub fn tile_offsets(&self, grid: GridRect, out: &mut Vec<u32>) {
        out.clear();
        out.reserve(grid.cell_count());
        for j in 0..grid.rows as i32 {
            for i in 0..grid.cols as i32 {
                let tile = IVec2::new(grid.x + i, grid.y + j);
                out.push(self.get(tile).map_or(EMPTY_TILE, |t| t.0));
            }
        }
    }
}

/// Unordered bag of objects drawn on top of every tile layer.
#[derive(Default)]
pub struct ObjectLayer {
    pub name: String,
    objects: Vec<Box<dyn WorldObject>>,
}

impl ObjectLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), objects: Vec::new() }
    }

    pub fn push(&mut self, object: impl WorldObject + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn WorldObject> {
        self.objects.iter().map(|o| o.as_ref())
    }

    /// Objects whose bounds overlap `rect`.
    pub fn query(&self, rect: Rect) -> impl Iterator<Item = &dyn WorldObject> {
        self.iter().filter(move |o| o.bounds().intersects(rect))
    }
}

impl std::fmt::Debug for ObjectLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectLayer")
            .field("name", &self.name)
            .field("objects", &self.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::object::Item;

    // ── tile layer ────────────────────────────────────────────────────────

    #[test]
    fn set_outside_layer_is_rejected() {
        let mut layer = TileLayer::new("ground", IVec2::new(-2, -2), 4, 4);
        assert!(layer.set(IVec2::new(1, 1), Some(TileId(7))));
        assert!(!layer.set(IVec2::new(2, 0), Some(TileId(7))));
        assert_eq!(layer.get(IVec2::new(1, 1)), Some(TileId(7)));
    }

    #[test]
    fn tile_offsets_pad_with_empty() {
        let mut layer = TileLayer::new("ground", IVec2::ZERO, 2, 2);
        layer.fill(Some(TileId(1)));
        layer.set(IVec2::new(1, 1), Some(TileId(4)));

        let mut out = vec![99; 3];
        layer.tile_offsets(GridRect::new(0, 0, 3, 2), &mut out);
        assert_eq!(out, vec![1, 1, EMPTY_TILE, 1, 4, EMPTY_TILE]);
    }

    // ── object layer ──────────────────────────────────────────────────────

    #[test]
    fn query_returns_only_intersecting_objects() {
        let mut layer = ObjectLayer::new("items");
        layer.push(Item::new(Vec2::new(0.0, 0.0), TileId(0)));
        layer.push(Item::new(Vec2::new(20.0, 0.0), TileId(1)));
        layer.push(Item::new(Vec2::new(4.4, 0.0), TileId(2)));

        let hits: Vec<TileId> = layer
            .query(Rect::new(-4.0, -4.0, 8.0, 8.0))
            .map(|o| o.tile())
            .collect();
        assert_eq!(hits, vec![TileId(0), TileId(2)]);
    }
}
