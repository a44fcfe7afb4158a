use glam::Vec2;

use crate::geom::Rect;
use crate::tileset::TileId;

/// Cardinal facing. Sprites are authored facing [`Direction::North`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Counter-clockwise rotation in radians from the authored orientation.
    pub fn angle(self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Direction::North => 0.0,
            Direction::East => -FRAC_PI_2,
            Direction::South => PI,
            Direction::West => FRAC_PI_2,
        }
    }
}

/// Capability: the object has a facing direction and is drawn rotated.
pub trait Facing {
    fn direction(&self) -> Direction;
}

/// Anything placed on an object layer.
///
/// Optional capabilities are exposed as queries returning `None` when absent;
/// callers branch on the option instead of probing concrete types.
pub trait WorldObject {
    /// Center in world units.
    fn position(&self) -> Vec2;

    fn tile(&self) -> TileId;

    /// Half of the drawn edge length in world units.
    fn half_size(&self) -> f32 {
        0.5
    }

    fn facing(&self) -> Option<&dyn Facing> {
        None
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.position(), Vec2::splat(self.half_size() * 2.0))
    }
}

/// Static object (pick-ups, props).
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub position: Vec2,
    pub tile: TileId,
    pub half_size: f32,
}

impl Item {
    pub fn new(position: Vec2, tile: TileId) -> Self {
        Self { position, tile, half_size: 0.5 }
    }
}

impl WorldObject for Item {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn tile(&self) -> TileId {
        self.tile
    }

    fn half_size(&self) -> f32 {
        self.half_size
    }
}

/// Object with a facing direction (characters, vehicles).
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub position: Vec2,
    pub tile: TileId,
    pub half_size: f32,
    pub direction: Direction,
}

impl Agent {
    pub fn new(position: Vec2, tile: TileId, direction: Direction) -> Self {
        Self { position, tile, half_size: 0.5, direction }
    }
}

impl Facing for Agent {
    fn direction(&self) -> Direction {
        self.direction
    }
}

impl WorldObject for Agent {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn tile(&self) -> TileId {
        self.tile
    }

    fn half_size(&self) -> f32 {
        self.half_size
    }

    fn facing(&self) -> Option<&dyn Facing> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_has_no_facing() {
        let item = Item::new(Vec2::ZERO, TileId(3));
        assert!(item.facing().is_none());
    }

    #[test]
    fn agent_exposes_facing() {
        let agent = Agent::new(Vec2::ZERO, TileId(1), Direction::West);
        let facing = agent.facing().map(|f| f.direction());
        assert_eq!(facing, Some(Direction::West));
    }

    #[test]
    fn bounds_use_half_size() {
        let mut item = Item::new(Vec2::new(3.0, 4.0), TileId(0));
        item.half_size = 1.5;
        assert_eq!(item.bounds(), Rect::new(1.5, 2.5, 3.0, 3.0));
    }
}
