//! # Terrain Pipeline Entry Point
//!
//! Native entry point for the terrain demo. Loads a world configuration from
//! the JSON file given as the first argument (or falls back to the defaults),
//! then runs the pipeline to completion via the library's `run()`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- worldgen.json
//! ```

use std::env;
use std::path::Path;
use std::process;

use voxel_terrain::engine::generation::attributes::WorldGenConfig;

fn main() {
    voxel_terrain::init_logging();

    if let Err(error) = try_main() {
        log::error!("Failed to load world configuration: {}", error);
        process::exit(1);
    }
}

fn try_main() -> Result<(), serde_json::Error> {
    let config = match env::args().nth(1) {
        Some(path) => WorldGenConfig::from_file(Path::new(&path))?,
        None => WorldGenConfig::default(),
    };

    voxel_terrain::run(config);
    Ok(())
}
