use anyhow::{Context, Result};
use bloksel_core::{Block, BlockType, ChunkPosition, EngineConfig, World};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::env;
use std::path::Path;

const WARMUP_STEPS: usize = 20;
const STEP_SECONDS: f64 = 0.05;

fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .context("Failed to install logger")?;

    let mut args = env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => EngineConfig::load(Path::new(&path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.next() {
        config.worldgen.seed = seed
            .parse()
            .with_context(|| format!("Invalid seed: {}", seed))?;
    }

    info!("Opening world in {:?}", config.save_dir);
    let mut world = World::new(config).context("Failed to open world")?;
    let chunks = world.generate_spawn_area();
    info!("Generated {} spawn chunks", chunks);

    for _ in 0..WARMUP_STEPS {
        world.update(STEP_SECONDS);
    }

    let spawn = world.spawn_point();
    world.set_block(spawn.x + 1, spawn.y, spawn.z, Block::new(BlockType::Torch));
    info!(
        "Placed torch at ({}, {}, {}), light {}",
        spawn.x + 1,
        spawn.y,
        spawn.z,
        world.get_block_light(spawn.x + 1, spawn.y, spawn.z)
    );

    let spawn_chunk = ChunkPosition::from_world(spawn.x, spawn.z);
    let mesh = world.chunk_mesh(spawn_chunk);
    info!(
        "Spawn chunk {} mesh: {} quads, {} bytes",
        spawn_chunk,
        mesh.quad_count,
        mesh.as_bytes().len()
    );

    let saved = world.save_all().context("Failed to save world")?;
    info!("Saved {} chunks", saved);

    let stats = serde_json::to_string_pretty(&world.statistics())
        .context("Failed to serialize statistics")?;
    println!("{}", stats);

    world.shutdown().context("Failed to shut down world")?;
    Ok(())
}
