//! World snapshot types consumed by the vantage renderer.
//!
//! The renderer only reads these: ordered tile layers, ordered object layers
//! and the tileset table. Simulation, physics and action resolution live
//! elsewhere and mutate the world between frames.

mod geom;
mod layer;
mod object;
mod tileset;
mod world;

pub use geom::{GridRect, Rect};
pub use layer::{ObjectLayer, TileLayer};
pub use object::{Agent, Direction, Facing, Item, WorldObject};
pub use tileset::{TileId, TileSheet, Tileset, EMPTY_TILE};
pub use world::World;
