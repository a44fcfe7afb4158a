use crate::layer::{ObjectLayer, TileLayer};
use crate::tileset::Tileset;

/// Read-only snapshot handed to the renderer each frame.
///
/// Tile layers draw in insertion order (back to front); object layers draw
/// after every tile layer.
#[derive(Debug)]
pub struct World {
    tileset: Tileset,
    tile_layers: Vec<TileLayer>,
    object_layers: Vec<ObjectLayer>,
}

impl World {
    pub fn new(tileset: Tileset) -> Self {
        Self {
            tileset,
            tile_layers: Vec::new(),
            object_layers: Vec::new(),
        }
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn object_layers(&self) -> &[ObjectLayer] {
        &self.object_layers
    }

    pub fn push_tile_layer(&mut self, layer: TileLayer) -> &mut TileLayer {
        self.tile_layers.push(layer);
        let last = self.tile_layers.len() - 1;
        &mut self.tile_layers[last]
    }

    pub fn push_object_layer(&mut self, layer: ObjectLayer) -> &mut ObjectLayer {
        self.object_layers.push(layer);
        let last = self.object_layers.len() - 1;
        &mut self.object_layers[last]
    }

    pub fn tile_layer_mut(&mut self, name: &str) -> Option<&mut TileLayer> {
        self.tile_layers.iter_mut().find(|l| l.name == name)
    }

    pub fn object_layer_mut(&mut self, name: &str) -> Option<&mut ObjectLayer> {
        self.object_layers.iter_mut().find(|l| l.name == name)
    }
}
