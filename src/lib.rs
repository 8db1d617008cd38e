#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A multi-threaded voxel terrain pipeline: procedural generation staged over
//! a worker pool, face-culled meshing against a movable section plane, and a
//! driver that sequences each chunk from empty volume to uploaded buffers.
//!
//! ## Key Modules
//!
//! * `core` - Shared-state and cancellation primitives used across threads
//! * `engine` - The world driver plus its generation, meshing, executor, and
//!   voxel-storage submodules
//!
//! ## Architecture
//!
//! The pipeline splits into clear layers:
//! * Voxel data management (block volumes, the chunk grid, per-chunk state
//!   machines)
//! * Terrain generation (height map, strata, ores, and vegetation stages over
//!   fractal noise)
//! * Meshing (hidden-face culling, section capping, decorative cross quads,
//!   collision quads)
//! * Job scheduling (a fixed worker pool with an overflow queue, or detached
//!   per-job threads)
//!
//! Workers never hold a chunk; they hold the chunk's volume handle plus a
//! generation number, so stale results are fenced off instead of locked out.
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_terrain::engine::generation::attributes::WorldGenConfig;
//!
//! fn main() {
//!     voxel_terrain::init_logging();
//!     voxel_terrain::run(WorldGenConfig::default());
//! }
//! ```
//!
//! Configuration comes from a JSON file whose fields all default, so an empty
//! object is a valid world.
//!
//! ## Performance Considerations
//!
//! * Chunk volumes store one atomic byte per block; generation stages write
//!   concurrently with driver reads, and meshing decodes a relaxed snapshot
//!   once instead of locking per block
//! * Stage jobs are one chunk each, so the pool scales by chunk count
//! * Finalized meshes swap in whole; readers never see a half-built mesh

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cgmath::Point3;
use log::{info, warn};

pub mod core;
pub mod engine;

use engine::generation::attributes::WorldGenConfig;
use engine::generation::noise_map::FractalNoise;
use engine::generation::{TerrainGenerator, TuftPlacer};
use engine::meshing::upload::LoggingUpload;
use engine::WorldEngine;

/// Ticks to wait for the demo world to settle before giving up.
const MAX_DEMO_TICKS: usize = 60_000;

/// Initializes structured logging to stdout, filtered by `RUST_LOG`.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
}

/// Generates and meshes a small demo world, then tears it down.
///
/// Streams in a 5x5 square of chunks around the origin, ticks the engine
/// until every chunk settles, and logs aggregate mesh statistics. This is the
/// whole pipeline end to end, driven exactly the way an embedding application
/// would drive it.
pub fn run(config: WorldGenConfig) {
    let config = Arc::new(config);
    let noise = Arc::new(FractalNoise::new(config.seed));
    let generator = Arc::new(TerrainGenerator::new(
        Arc::clone(&config),
        noise,
        Arc::new(TuftPlacer),
    ));
    let mut engine = WorldEngine::new(Arc::clone(&config), generator, Box::new(LoggingUpload));

    let center = Point3::new(0, 0, 0);
    engine.stream_in(center, 2);

    let mut settled = false;
    for _ in 0..MAX_DEMO_TICKS {
        engine.tick();
        if engine.is_settled() {
            settled = true;
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    if !settled {
        warn!("World did not settle within {} ticks", MAX_DEMO_TICKS);
    }

    let statistics = engine.mesh_statistics();
    info!(
        "Finalized {} of {} chunks: {} render quads, {} collision quads",
        statistics.meshed_chunks,
        statistics.chunks,
        statistics.render_faces,
        statistics.collision_faces
    );

    let positions = engine.grid().get().positions();
    for position in positions {
        engine.stream_out(position);
    }
    info!("World torn down");
}
