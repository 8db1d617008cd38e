//! # Generation Attributes Module
//!
//! Serde-backed configuration for the terrain pipeline. Every stage reads its
//! tuning knobs from these structs, and `WorldGenConfig` aggregates the lot
//! plus the engine-level settings (seed, worker count, debug options).
//!
//! All fields are defaulted, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! {
//!     "seed": 1337,
//!     "height": { "height_magnitude": 96.0 },
//!     "ores": [
//!         { "block": "coal", "density": 0.4, "height_limit": 200 }
//!     ]
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::engine::generation::noise_map::{NoiseMethod, NoiseParams};
use crate::engine::voxels::block::block_type::BlockType;
use crate::engine::voxels::chunk::state::ChunkState;
use crate::engine::voxels::chunk::volume::CHUNK_HEIGHT;

/// Tuning for the height-map stage.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeightAttributes {
    /// Noise settings for the surface-height field.
    pub noise: NoiseParams,
    /// Horizontal divisor; larger values stretch features wider.
    pub width_magnitude: f64,
    /// Vertical extent of the terrain above the floor, in blocks.
    pub height_magnitude: f64,
    /// Block used instead of stone when debug mode is on.
    pub debug_block: BlockType,
}

impl Default for HeightAttributes {
    fn default() -> Self {
        HeightAttributes {
            noise: NoiseParams {
                octaves: 4,
                ..NoiseParams::default()
            },
            width_magnitude: 80.0,
            height_magnitude: 48.0,
            debug_block: BlockType::BRICK,
        }
    }
}

/// Tuning for the strata stage, which dresses exposed stone in soil.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StrataAttributes {
    /// Noise settings for the soil-thickness field.
    pub noise: NoiseParams,
    /// Block placed on the top cell of each soil run.
    pub surface_block: BlockType,
    /// Block placed beneath the surface block.
    pub filler_block: BlockType,
    /// Upper bound on soil run length, in blocks.
    pub max_thickness: i32,
}

impl Default for StrataAttributes {
    fn default() -> Self {
        StrataAttributes {
            noise: NoiseParams {
                frequency: 0.13,
                octaves: 2,
                ..NoiseParams::default()
            },
            surface_block: BlockType::GRASS,
            filler_block: BlockType::DIRT,
            max_thickness: 5,
        }
    }
}

/// Tuning for one ore species within the ore stage.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OreAttributes {
    /// Noise settings for this ore's density field.
    pub noise: NoiseParams,
    /// Per-axis divisors applied to the sample point.
    pub width: [f64; 3],
    /// Density threshold in [0, 1] the normalized sample is compared against.
    pub density: f64,
    /// When set, the ore forms where the sample exceeds the threshold
    /// instead of falling below it.
    pub inverted: bool,
    /// World-space height above which this ore never forms.
    pub height_limit: i32,
    /// Block the matched stone cells become.
    pub block: BlockType,
}

impl Default for OreAttributes {
    fn default() -> Self {
        OreAttributes {
            noise: NoiseParams {
                method: NoiseMethod::Perlin,
                dimensions: 3,
                octaves: 2,
                ..NoiseParams::default()
            },
            width: [10.0; 3],
            density: 0.35,
            inverted: false,
            height_limit: CHUNK_HEIGHT,
            block: BlockType::COAL,
        }
    }
}

/// Tuning for the vegetation stage.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VegetationAttributes {
    /// Noise settings for the planting mask.
    pub noise: NoiseParams,
    /// Columns whose normalized mask sample is at or above this value stay
    /// bare, unless the jittered re-sample falls back below it.
    pub threshold: f64,
    /// Exclusive upper bound for the per-column jitter offsets.
    pub jitter_range: i32,
}

impl Default for VegetationAttributes {
    fn default() -> Self {
        VegetationAttributes {
            noise: NoiseParams {
                frequency: 0.1,
                octaves: 2,
                ..NoiseParams::default()
            },
            threshold: 0.5,
            jitter_range: 200,
        }
    }
}

/// Tuning for the density stage, a volumetric carve/fill pass used for
/// debugging shapes and as the template for cave-style stages.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DensityAttributes {
    /// Noise settings for the volumetric field.
    pub noise: NoiseParams,
    /// Per-axis divisors applied to the sample point.
    pub width: [f64; 3],
    /// Density threshold in [0, 1].
    pub density: f64,
    /// When set, cells where the sample exceeds the threshold match.
    pub inverted: bool,
    /// Block written into matched cells.
    pub block: BlockType,
}

impl Default for DensityAttributes {
    fn default() -> Self {
        DensityAttributes {
            noise: NoiseParams {
                dimensions: 3,
                octaves: 4,
                ..NoiseParams::default()
            },
            width: [50.0; 3],
            density: 0.45,
            inverted: true,
            block: BlockType::BRICK,
        }
    }
}

/// The whole pipeline's configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    /// Seed shared by every noise lattice and stage RNG.
    pub seed: u32,
    /// World height below which columns are always filled.
    pub floor_height: i32,
    /// Initial horizontal slice level; geometry at or above it is hidden.
    pub section_level: i32,
    /// Height-map stage settings.
    pub height: HeightAttributes,
    /// Strata stage settings.
    pub strata: StrataAttributes,
    /// Density stage settings.
    pub density: DensityAttributes,
    /// Ore species, matched in order; the first match claims the cell.
    pub ores: Vec<OreAttributes>,
    /// Vegetation stage settings.
    pub vegetation: VegetationAttributes,
    /// Worker threads in the stage executor pool.
    pub workers: usize,
    /// Dispatches every job on its own thread instead of the worker pool.
    /// Faster to start, unbounded in thread count; meant for small worlds
    /// and debugging.
    pub detached_dispatch: bool,
    /// How long a chunk may sit in its updating state before the engine
    /// assumes the job was lost and recovers it.
    pub stuck_timeout_ms: u64,
    /// Swaps terrain stone for the height stage's debug block and starts
    /// chunks in `debug_start_state` when one is set.
    pub debug_mode: bool,
    /// Optional single-stage start state for debug chunks.
    pub debug_start_state: Option<ChunkState>,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        WorldGenConfig {
            seed: 0,
            floor_height: 32,
            section_level: CHUNK_HEIGHT,
            height: HeightAttributes::default(),
            strata: StrataAttributes::default(),
            density: DensityAttributes::default(),
            ores: default_ores(),
            vegetation: VegetationAttributes::default(),
            workers: 4,
            detached_dispatch: false,
            stuck_timeout_ms: 5000,
            debug_mode: false,
            debug_start_state: None,
        }
    }
}

impl WorldGenConfig {
    /// Reads a config from a JSON file, filling omitted fields with defaults.
    pub fn from_file(path: &Path) -> Result<Self, serde_json::Error> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        serde_json::from_reader(BufReader::new(file))
    }
}

fn default_ores() -> Vec<OreAttributes> {
    let base = OreAttributes::default();
    vec![
        OreAttributes {
            width: [14.0; 3],
            density: 0.38,
            height_limit: 128,
            block: BlockType::COAL,
            ..base
        },
        OreAttributes {
            width: [12.0; 3],
            density: 0.35,
            height_limit: 64,
            block: BlockType::IRON,
            ..base
        },
        OreAttributes {
            width: [10.0; 3],
            density: 0.33,
            height_limit: 32,
            block: BlockType::GOLD,
            ..base
        },
        OreAttributes {
            width: [8.0; 3],
            density: 0.31,
            height_limit: 16,
            block: BlockType::DIAMOND,
            ..base
        },
        OreAttributes {
            width: [8.0; 3],
            density: 0.32,
            height_limit: 16,
            block: BlockType::REDSTONE,
            ..base
        },
    ]
}
