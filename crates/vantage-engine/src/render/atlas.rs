//! Tileset atlas packing.
//!
//! Sheets are sliced into tiles (row-major, sheet order) and repacked into one
//! square-ish texture with a transparent border and a gap between tiles, so
//! nearest sampling at tile edges never picks up a neighbour.

use anyhow::{Context, Result};
use image::{imageops, RgbaImage};
use vantage_world::{TileSheet, Tileset};

use crate::device::{AtlasLayout, TextureData};

/// Transparent padding around the packed tiles.
pub const ATLAS_BORDER: u32 = 1;
/// Gap between packed tiles.
pub const ATLAS_MARGIN: u32 = 2;

/// Decodes every sheet of `tileset` and packs its tiles into one texture.
pub fn build_atlas(tileset: &Tileset) -> Result<(TextureData, AtlasLayout)> {
    let tile = tileset.tile_size;
    anyhow::ensure!(
        tile.x > 0 && tile.y > 0,
        "tileset '{}' has an empty tile size",
        tileset.name
    );

    let mut tiles = Vec::new();
    for (i, sheet) in tileset.sheets.iter().enumerate() {
        let image = decode_sheet(sheet)
            .with_context(|| format!("tileset '{}': failed to load sheet {i}", tileset.name))?;
        slice_sheet(&image, tile.x, tile.y, tileset.margin, &mut tiles);
    }

    let tile_count = u32::try_from(tiles.len()).context("too many tiles")?;
    let tiles_per_row = (tile_count as f64).sqrt().ceil().max(1.0) as u32;
    let rows = tile_count.div_ceil(tiles_per_row).max(1);
    let extent = |tile: u32, n: u32| 2 * ATLAS_BORDER + n * tile + (n - 1) * ATLAS_MARGIN;

    let layout = AtlasLayout {
        tile_size: tile.to_array(),
        atlas_size: [extent(tile.x, tiles_per_row), extent(tile.y, rows)],
        margin: ATLAS_MARGIN,
        border: ATLAS_BORDER,
        tiles_per_row,
        tile_count,
    };

    let mut atlas = RgbaImage::new(layout.atlas_size[0], layout.atlas_size[1]);
    for (index, tile_image) in (0u32..).zip(&tiles) {
        if let Some(origin) = layout.tile_origin(index) {
            imageops::replace(&mut atlas, tile_image, origin.x as i64, origin.y as i64);
        }
    }

    log::debug!(
        "packed tileset '{}': {} tiles into {}x{}",
        tileset.name,
        tile_count,
        layout.atlas_size[0],
        layout.atlas_size[1]
    );

    let data = TextureData {
        width: atlas.width(),
        height: atlas.height(),
        pixels: atlas.into_raw(),
    };
    Ok((data, layout))
}

fn decode_sheet(sheet: &TileSheet) -> Result<RgbaImage> {
    match sheet {
        TileSheet::File(path) => Ok(image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgba8()),
        TileSheet::Rgba { width, height, pixels } => {
            RgbaImage::from_raw(*width, *height, pixels.clone()).with_context(|| {
                format!("sheet is {} bytes, expected {width}x{height} RGBA8", pixels.len())
            })
        }
    }
}

/// Appends every whole tile of `sheet`; partial tiles at the edges are dropped.
fn slice_sheet(sheet: &RgbaImage, tw: u32, th: u32, margin: u32, out: &mut Vec<RgbaImage>) {
    let cols = (sheet.width() + margin) / (tw + margin);
    let rows = (sheet.height() + margin) / (th + margin);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * (tw + margin);
            let y = row * (th + margin);
            out.push(imageops::crop_imm(sheet, x, y, tw, th).to_image());
        }
    }
}
