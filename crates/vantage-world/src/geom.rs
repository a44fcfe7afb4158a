use glam::{IVec2, Vec2};

/// Axis-aligned rectangle in world units (one unit = one tile, +Y up).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            origin: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// True when the interiors overlap. Rects that only share an edge do not.
    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        self.intersect(other).is_some()
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let lo = self.min().max(other.min());
        let hi = self.max().min(other.max());
        let size = hi - lo;

        if size.x <= 0.0 || size.y <= 0.0 {
            None
        } else {
            Some(Rect::from_origin_size(lo, size))
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }
}

/// Integer tile rectangle: `cols × rows` cells starting at tile `(x, y)`.
///
/// Cells are addressed row-major from the bottom-left: cell `(i, j)` covers
/// world `[x + i, x + i + 1) × [y + j, y + j + 1)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub cols: u32,
    pub rows: u32,
}

impl GridRect {
    #[inline]
    pub const fn new(x: i32, y: i32, cols: u32, rows: u32) -> Self {
        Self { x, y, cols, rows }
    }

    #[inline]
    pub fn origin(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn cell_count(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// World-space center of the rectangle.
    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.cols as f32 * 0.5,
            self.y as f32 + self.rows as f32 * 0.5,
        )
    }

    #[inline]
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x as f32, self.y as f32, self.cols as f32, self.rows as f32)
    }

    #[inline]
    pub fn contains_tile(self, tile: IVec2) -> bool {
        tile.x >= self.x
            && tile.y >= self.y
            && ((tile.x - self.x) as u32) < self.cols
            && ((tile.y - self.y) as u32) < self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn contains_min_inclusive_max_exclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(b), Some(r(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(b));
    }

    #[test]
    fn from_center_size_is_centered() {
        let rect = Rect::from_center_size(Vec2::new(2.0, -1.0), Vec2::new(4.0, 2.0));
        assert_eq!(rect, r(0.0, -2.0, 4.0, 2.0));
        assert_eq!(rect.center(), Vec2::new(2.0, -1.0));
    }

    // ── grid rect ─────────────────────────────────────────────────────────

    #[test]
    fn grid_contains_tile_half_open() {
        let g = GridRect::new(-2, -2, 4, 4);
        assert!(g.contains_tile(IVec2::new(-2, -2)));
        assert!(g.contains_tile(IVec2::new(1, 1)));
        assert!(!g.contains_tile(IVec2::new(2, 0)));
        assert!(!g.contains_tile(IVec2::new(0, -3)));
    }

    #[test]
    fn grid_center_and_rect() {
        let g = GridRect::new(-3, 1, 6, 4);
        assert_eq!(g.center(), Vec2::new(0.0, 3.0));
        assert_eq!(g.to_rect(), r(-3.0, 1.0, 6.0, 4.0));
        assert_eq!(g.cell_count(), 24);
    }
}
