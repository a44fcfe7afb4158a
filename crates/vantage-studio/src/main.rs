//! Headless studio: loads a TOML scene, renders every camera for a number of
//! frames and writes the gathered images as PNG files.

mod output;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use vantage_engine::device::GpuInit;
use vantage_engine::logging::{init_logging, LoggingConfig};
use vantage_engine::{RenderRequest, Renderer};
use vantage_world::World;

use scene::{CameraDef, Scene};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// CPU rasterizer.
    Software,
    /// Headless wgpu.
    Gpu,
}

#[derive(Debug, Parser)]
#[command(name = "vantage-studio", version, about = "Render tile-world cameras to PNG frames")]
struct Args {
    /// Scene description (TOML).
    scene: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Backend::Software)]
    backend: Backend,

    /// Frames to render per camera.
    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    /// Directory for `<camera>_<frame>.png`.
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,

    /// Log filter, `env_logger` syntax. Defaults to `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let scene = Scene::load(&args.scene)?;
    let base_dir = args.scene.parent().map(PathBuf::from).unwrap_or_default();
    let world = scene.build_world(&base_dir)?;

    let mut renderer = match args.backend {
        Backend::Software => Renderer::software(),
        Backend::Gpu => Renderer::headless(&GpuInit {
            allow_fallback_adapter: true,
            ..Default::default()
        })?,
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let mut cameras: Vec<(&CameraDef, RenderRequest)> = Vec::with_capacity(scene.cameras.len());
    let result = setup(&scene, &world, &mut renderer, &mut cameras)
        .and_then(|()| run(&args, &world, &mut renderer, &mut cameras));

    for (_, request) in &mut cameras {
        request.dispose(&mut renderer);
    }
    result
}

fn setup<'s>(
    scene: &'s Scene,
    world: &World,
    renderer: &mut Renderer,
    cameras: &mut Vec<(&'s CameraDef, RenderRequest)>,
) -> Result<()> {
    for def in &scene.cameras {
        let mut request = RenderRequest::new();
        def.configure(&mut request)?;
        // Pushed before init so a failed init is still disposed.
        cameras.push((def, request));
        if let Some((_, request)) = cameras.last_mut() {
            request
                .init(renderer, world)
                .with_context(|| format!("failed to initialize camera '{}'", def.name))?;
        }
    }
    Ok(())
}

fn run(
    args: &Args,
    world: &World,
    renderer: &mut Renderer,
    cameras: &mut [(&CameraDef, RenderRequest)],
) -> Result<()> {
    for frame in 0..args.frames {
        for (def, request) in cameras.iter_mut() {
            if frame > 0 && def.velocity != [0.0, 0.0] {
                let p = request.position();
                let step = Vec2::from(def.velocity);
                request.set_position(p + step.extend(0.0))?;
            }

            request
                .draw(renderer, world)
                .with_context(|| format!("camera '{}' failed on frame {frame}", def.name))?;

            let res = request.resolution();
            let path = args.output.join(format!("{}_{frame:04}.png", def.name));
            output::write_png(&path, request.image(), res.width(), res.height())?;
            log::info!("wrote {}", path.display());
        }
    }
    Ok(())
}
