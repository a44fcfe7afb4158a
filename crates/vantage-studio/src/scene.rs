//! TOML scene files: tileset, layers and cameras.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::{IVec2, UVec2, Vec2, Vec3};
use serde::Deserialize;
use vantage_engine::{NoiseSettings, RenderRequest};
use vantage_world::{
    Agent, Direction, Item, ObjectLayer, TileId, TileLayer, TileSheet, Tileset, World,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub tileset: TilesetDef,
    #[serde(default)]
    pub tile_layers: Vec<TileLayerDef>,
    #[serde(default)]
    pub object_layers: Vec<ObjectLayerDef>,
    pub cameras: Vec<CameraDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilesetDef {
    pub name: String,
    pub tile_size: [u32; 2],
    #[serde(default)]
    pub margin: u32,
    /// Image files, relative to the scene file.
    #[serde(default)]
    pub sheets: Vec<PathBuf>,
    /// Solid-color tiles appended after the file sheets, one per entry.
    #[serde(default)]
    pub palette: Vec<[u8; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileLayerDef {
    pub name: String,
    pub origin: [i32; 2],
    pub size: [u32; 2],
    pub fill: Option<u32>,
    #[serde(default)]
    pub rects: Vec<TileRectDef>,
}

/// Tiles `[x, x + w) × [y, y + h)` set to `tile`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileRectDef {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub tile: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectLayerDef {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectDef {
    Item {
        position: [f32; 2],
        tile: u32,
        half_size: Option<f32>,
    },
    Agent {
        position: [f32; 2],
        tile: u32,
        half_size: Option<f32>,
        #[serde(default)]
        facing: FacingDef,
    },
}

#[derive(Debug, Copy, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingDef {
    #[default]
    North,
    East,
    South,
    West,
}

impl From<FacingDef> for Direction {
    fn from(f: FacingDef) -> Self {
        match f {
            FacingDef::North => Direction::North,
            FacingDef::East => Direction::East,
            FacingDef::South => Direction::South,
            FacingDef::West => Direction::West,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDef {
    pub name: String,
    #[serde(default = "default_position")]
    pub position: [f32; 3],
    #[serde(default = "default_size")]
    pub size: [f32; 2],
    #[serde(default = "default_resolution")]
    pub resolution: [u32; 2],
    /// World units moved per frame.
    #[serde(default)]
    pub velocity: [f32; 2],
    pub noise: Option<NoiseDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseDef {
    #[serde(default = "default_noise_color")]
    pub color: [u8; 4],
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub mean_offset: f32,
}

fn default_position() -> [f32; 3] {
    RenderRequest::DEFAULT_POSITION.to_array()
}

fn default_size() -> [f32; 2] {
    RenderRequest::DEFAULT_SIZE.to_array()
}

fn default_resolution() -> [u32; 2] {
    [256, 256]
}

fn default_noise_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

fn default_speed() -> f32 {
    1.0
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scene {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(text)?;
        anyhow::ensure!(!scene.cameras.is_empty(), "scene has no cameras");
        Ok(scene)
    }

    /// Builds the world; sheet paths resolve against `base_dir`.
    pub fn build_world(&self, base_dir: &Path) -> Result<World> {
        let mut world = World::new(self.tileset.build(base_dir));

        for def in &self.tile_layers {
            let layer = world.push_tile_layer(TileLayer::new(
                def.name.clone(),
                IVec2::from(def.origin),
                def.size[0],
                def.size[1],
            ));
            layer.fill(def.fill.map(TileId));
            for r in &def.rects {
                for y in r.y..r.y + r.h as i32 {
                    for x in r.x..r.x + r.w as i32 {
                        if !layer.set(IVec2::new(x, y), Some(TileId(r.tile))) {
                            log::warn!("layer '{}': tile ({x}, {y}) is outside the layer", def.name);
                        }
                    }
                }
            }
        }

        for def in &self.object_layers {
            let layer = world.push_object_layer(ObjectLayer::new(def.name.clone()));
            for object in &def.objects {
                match *object {
                    ObjectDef::Item { position, tile, half_size } => {
                        let mut item = Item::new(Vec2::from(position), TileId(tile));
                        item.half_size = half_size.unwrap_or(item.half_size);
                        layer.push(item);
                    }
                    ObjectDef::Agent { position, tile, half_size, facing } => {
                        let mut agent = Agent::new(Vec2::from(position), TileId(tile), facing.into());
                        agent.half_size = half_size.unwrap_or(agent.half_size);
                        layer.push(agent);
                    }
                }
            }
        }

        Ok(world)
    }
}

impl TilesetDef {
    fn build(&self, base_dir: &Path) -> Tileset {
        let tile_size = UVec2::from(self.tile_size);
        let mut tileset = Tileset::new(self.name.clone(), tile_size).with_margin(self.margin);
        for sheet in &self.sheets {
            tileset = tileset.with_sheet(TileSheet::File(base_dir.join(sheet)));
        }
        if !self.palette.is_empty() {
            tileset = tileset.with_sheet(palette_sheet(&self.palette, tile_size, self.margin));
        }
        tileset
    }
}

/// One row of solid tiles with a darker one-pixel rim, spaced by `margin`.
fn palette_sheet(colors: &[[u8; 4]], tile: UVec2, margin: u32) -> TileSheet {
    let n = colors.len() as u32;
    let width = n * tile.x + n.saturating_sub(1) * margin;
    let height = tile.y;
    let mut pixels = vec![0u8; (width * height * 4) as usize];

    for (i, &[r, g, b, a]) in colors.iter().enumerate() {
        let x0 = i as u32 * (tile.x + margin);
        for y in 0..tile.y {
            for x in 0..tile.x {
                let rim = x == 0 || y == 0 || x + 1 == tile.x || y + 1 == tile.y;
                let shade = |c: u8| if rim { c / 4 * 3 } else { c };
                let at = (((y * width) + x0 + x) * 4) as usize;
                pixels[at..at + 4].copy_from_slice(&[shade(r), shade(g), shade(b), a]);
            }
        }
    }

    TileSheet::Rgba { width, height, pixels }
}

impl CameraDef {
    /// Applies this camera to a fresh request. Gathering is always on.
    pub fn configure(&self, request: &mut RenderRequest) -> Result<()> {
        let context = || format!("camera '{}'", self.name);
        request.set_position(Vec3::from(self.position)).with_context(context)?;
        request.set_size(Vec2::from(self.size)).with_context(context)?;
        request
            .set_resolution(self.resolution[0], self.resolution[1])
            .with_context(context)?;
        if let Some(noise) = &self.noise {
            request
                .set_noise(NoiseSettings {
                    enabled: true,
                    color: noise.color,
                    speed: noise.speed,
                    mean_offset: noise.mean_offset,
                })
                .with_context(context)?;
        }
        request.set_gather_image(true);
        Ok(())
    }
}
