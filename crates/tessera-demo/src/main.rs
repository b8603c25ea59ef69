use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tessera_engine::atlas::AtlasLoader;
use tessera_engine::config::{AssetPaths, SessionConfig};
use tessera_engine::core::FrameScheduler;
use tessera_engine::device::GpuInit;
use tessera_engine::logging::{init_logging, LoggingConfig};
use tessera_engine::scene::DemoScene;
use tessera_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::PhysicalSize;

/// Two colored quads and three atlas sprites; click a quad to identify it.
#[derive(Debug, Parser)]
#[command(name = "tessera-demo", version, about)]
struct Args {
    /// UV map: JSON object of sprite name -> [u0, v0, u1, v1].
    #[arg(long, env = "TESSERA_ATLAS_JSON", default_value = AssetPaths::DEFAULT_ATLAS_JSON)]
    atlas_json: PathBuf,

    /// Atlas image (PNG).
    #[arg(long, env = "TESSERA_ATLAS_IMAGE", default_value = AssetPaths::DEFAULT_ATLAS_IMAGE)]
    atlas_image: PathBuf,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Log filter in env_logger syntax; falls back to RUST_LOG.
    #[arg(long, env = "TESSERA_LOG")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let loader = AtlasLoader::new(AssetPaths {
        atlas_json: args.atlas_json,
        atlas_image: args.atlas_image,
    });
    let atlas = pollster::block_on(loader.load()).context("failed to load sprite atlas")?;
    log::info!("atlas loaded: {}x{}, {} sprites", atlas.image.width, atlas.image.height, atlas.uv.len());

    let config = RuntimeConfig {
        title: "tessera".to_string(),
        initial_size: PhysicalSize::new(args.width, args.height),
    };

    Runtime::run(
        config,
        GpuInit::default(),
        SessionConfig::default(),
        atlas,
        FrameScheduler::new(DemoScene),
    )
}
