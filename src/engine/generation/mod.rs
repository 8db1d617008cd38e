//! # Terrain Generation System
//!
//! This module turns empty chunk volumes into terrain through an ordered set
//! of generation stages, each a pass over one chunk's blocks.
//!
//! ## Architecture Overview
//!
//! The generation system consists of several key components:
//! - `TerrainGenerator`: Owns the stage registry and the shared sampling
//!   services, and runs one stage against one volume on request
//! - `GenerationStage`: A single pass (height map, strata, ores, ...) that
//!   reads its tuning from `WorldGenConfig` and writes blocks
//! - `StageContext`: Everything a stage may touch while it runs
//! - `FloraPlacer`: The seam the vegetation stage plants through
//!
//! ## Stage Pipeline
//! 1. `HeightMap` fills each column up to a noise-driven surface height
//! 2. `Strata` dresses the exposed stone surface in soil
//! 3. `Caves` is a reserved slot with no effect yet
//! 4. `Ores` seeds mineral veins inside the remaining stone
//! 5. `Vegetation` scatters ground cover on fertile surface blocks
//!
//! `DensityMap` sits outside the chain; it overwrites the whole volume with
//! a thresholded 3D field and exists for visualizing noise settings before
//! committing them to an ore or cave pass.
//!
//! ## Determinism
//! Every stage derives its randomness from the world seed, the chunk origin
//! and the stage kind, so re-generating a chunk reproduces it exactly and no
//! stage depends on scheduling order across chunks.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_terrain::engine::generation::{TerrainGenerator, TuftPlacer};
//! use voxel_terrain::engine::generation::attributes::WorldGenConfig;
//! use voxel_terrain::engine::generation::noise_map::FractalNoise;
//! use voxel_terrain::engine::voxels::chunk::state::StageKind;
//! use voxel_terrain::engine::voxels::chunk::volume::BlockVolume;
//!
//! let config = Arc::new(WorldGenConfig::default());
//! let generator = TerrainGenerator::new(
//!     Arc::clone(&config),
//!     Arc::new(FractalNoise::new(config.seed)),
//!     Arc::new(TuftPlacer),
//! );
//!
//! let volume = BlockVolume::new();
//! generator.run_stage(StageKind::HeightMap, &volume, Point3::new(0, 0, 0));
//! ```

pub mod attributes;
pub mod noise_map;

use cgmath::Point3;
use log::{debug, warn};

use crate::engine::voxels::block::block_type::BlockType;
use crate::engine::voxels::chunk::state::StageKind;
use crate::engine::voxels::chunk::volume::{BlockVolume, CHUNK_DIMENSION, CHUNK_HEIGHT};
use attributes::WorldGenConfig;
use noise_map::{NoiseMethod, NoiseSource};
use std::sync::Arc;

/// Everything a generation stage may read or write while it runs.
///
/// # Fields
/// - `volume`: The chunk's block storage, written in place
/// - `origin`: World-space position of the volume's (0, 0, 0) corner
/// - `config`: The pipeline configuration the stage reads its tuning from
/// - `noise`: Shared noise source for every sampled field
/// - `flora`: Plant placement seam used by the vegetation stage
/// - `rng_seed`: Seed for stage-local randomness, already mixed per chunk
pub struct StageContext<'a> {
    /// Block storage for the chunk being generated.
    pub volume: &'a BlockVolume,
    /// World-space origin of the volume.
    pub origin: Point3<i32>,
    /// Pipeline configuration.
    pub config: &'a WorldGenConfig,
    /// Noise source shared by all stages.
    pub noise: &'a dyn NoiseSource,
    /// Plant placement seam.
    pub flora: &'a dyn FloraPlacer,
    /// Seed for any stage-local RNG.
    pub rng_seed: u64,
}

/// One pass of the terrain pipeline.
///
/// Stages run on worker threads, one chunk at a time, so implementations must
/// be `Send + Sync` and must confine their writes to the context's volume.
pub trait GenerationStage: Send + Sync {
    /// A short name for log lines.
    fn name(&self) -> &'static str;
    /// Which slot in the pipeline this stage fills.
    fn kind(&self) -> StageKind;
    /// Runs the pass over one chunk.
    fn execute(&self, context: &StageContext<'_>);
}

/// Plants vegetation blocks on behalf of the vegetation stage.
///
/// Splitting placement out of the stage lets the scatter logic (which columns
/// get plants) stay fixed while the planted shapes vary, from single tufts to
/// eventual multi-block trees.
pub trait FloraPlacer: Send + Sync {
    /// Places a plant whose base sits at `local`, directly above `surface`.
    fn place(
        &self,
        volume: &BlockVolume,
        local: Point3<i32>,
        surface: BlockType,
        rng: &mut fastrand::Rng,
    );
}

/// Places single-block ground cover, mostly tall grass with the odd flower.
pub struct TuftPlacer;

impl FloraPlacer for TuftPlacer {
    fn place(
        &self,
        volume: &BlockVolume,
        local: Point3<i32>,
        _surface: BlockType,
        rng: &mut fastrand::Rng,
    ) {
        let plant = match rng.u8(0..8) {
            0 => BlockType::ROSE,
            1 => BlockType::DANDELION,
            _ => BlockType::TALLGRASS,
        };
        volume.set(local.x, local.y, local.z, plant);
    }
}

/// Runs generation stages against chunk volumes.
///
/// The generator owns the stage registry plus the services stages share (the
/// noise source and the flora placer). It holds no per-chunk state, so one
/// instance can be shared across every worker thread behind an `Arc`.
pub struct TerrainGenerator {
    config: Arc<WorldGenConfig>,
    noise: Arc<dyn NoiseSource>,
    flora: Arc<dyn FloraPlacer>,
    stages: Vec<Box<dyn GenerationStage>>,
}

impl TerrainGenerator {
    /// Creates a generator with the standard stage set.
    pub fn new(
        config: Arc<WorldGenConfig>,
        noise: Arc<dyn NoiseSource>,
        flora: Arc<dyn FloraPlacer>,
    ) -> Self {
        TerrainGenerator {
            config,
            noise,
            flora,
            stages: vec![
                Box::new(HeightMapStage),
                Box::new(StrataStage),
                Box::new(CaveStage),
                Box::new(DensityMapStage),
                Box::new(OreStage),
                Box::new(VegetationStage),
            ],
        }
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    /// Registers a stage, replacing any existing stage of the same kind.
    ///
    /// This is how a real cave carver (or an experimental replacement for any
    /// other pass) slots into the pipeline without touching the chunk state
    /// machinery.
    pub fn with_stage(mut self, stage: Box<dyn GenerationStage>) -> Self {
        match self.stages.iter().position(|existing| existing.kind() == stage.kind()) {
            Some(index) => self.stages[index] = stage,
            None => self.stages.push(stage),
        }
        self
    }

    /// Runs the stage registered for `kind` over one chunk volume.
    ///
    /// Unknown kinds are logged and skipped rather than treated as fatal; the
    /// chunk simply keeps whatever blocks it had.
    pub fn run_stage(&self, kind: StageKind, volume: &BlockVolume, origin: Point3<i32>) {
        let stage = match self.stages.iter().find(|stage| stage.kind() == kind) {
            Some(stage) => stage,
            None => {
                warn!("No generation stage registered for {:?}", kind);
                return;
            }
        };

        debug!("Running {} stage for chunk at {:?}", stage.name(), origin);

        let context = StageContext {
            volume,
            origin,
            config: &self.config,
            noise: self.noise.as_ref(),
            flora: self.flora.as_ref(),
            rng_seed: stage_seed(self.config.seed, origin, kind),
        };
        stage.execute(&context);
    }
}

/// Maps a raw sample in [-1, 1] into [0, 1].
fn normalized(sample: f64) -> f64 {
    (sample + 1.0) * 0.5
}

/// Mixes the world seed, chunk origin and stage kind into one RNG seed.
fn stage_seed(seed: u32, origin: Point3<i32>, kind: StageKind) -> u64 {
    let mut state = 0xCBF2_9CE4_8422_2325_u64 ^ seed as u64;
    for part in [origin.x as u64, origin.y as u64, origin.z as u64, kind as u64] {
        state = (state ^ part).wrapping_mul(0x0000_0100_0000_01B3);
    }
    state
}

/// Fills each column up to a noise-driven surface height.
///
/// Cells below the world floor become sand, cells below the surface become
/// stone (or the configured debug block in debug mode) and everything above
/// is cleared. The stage rewrites the whole volume, so it is safe to re-run.
pub struct HeightMapStage;

impl GenerationStage for HeightMapStage {
    fn name(&self) -> &'static str {
        "height-map"
    }

    fn kind(&self) -> StageKind {
        StageKind::HeightMap
    }

    fn execute(&self, context: &StageContext<'_>) {
        let attributes = &context.config.height;
        let floor = context.config.floor_height as f64;

        for x in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                let world_x = (context.origin.x + x) as f64;
                let world_z = (context.origin.z + z) as f64;
                let point = [
                    world_x / attributes.width_magnitude,
                    0.0,
                    world_z / attributes.width_magnitude,
                ];

                let mut sample = normalized(context.noise.sample(point, &attributes.noise));
                // Value noise runs hot through the octave sum relative to
                // Perlin; damp it so one height_magnitude fits both.
                if attributes.noise.method == NoiseMethod::Value {
                    sample *= 0.5;
                }
                let surface = sample * attributes.height_magnitude + floor;

                for y in 0..CHUNK_HEIGHT {
                    let world_y = y as f64;
                    let block = if world_y < floor {
                        BlockType::SAND
                    } else if world_y < surface {
                        if context.config.debug_mode {
                            attributes.debug_block
                        } else {
                            BlockType::STONE
                        }
                    } else {
                        BlockType::NULL
                    };
                    context.volume.set(x, y, z, block);
                }
            }
        }
    }
}

/// Dresses the first sky-exposed stone cell of each column in soil.
///
/// Scanning top-down, the first stone cell with nothing above it gets the
/// surface block, and a noise-driven run of filler blocks continues downward
/// from there. Only that one transition per column is dressed; deeper ledges
/// and cave roofs keep their stone. The run length is clamped so it never
/// reaches below the bottom of the volume.
pub struct StrataStage;

impl GenerationStage for StrataStage {
    fn name(&self) -> &'static str {
        "strata"
    }

    fn kind(&self) -> StageKind {
        StageKind::Strata
    }

    fn execute(&self, context: &StageContext<'_>) {
        let attributes = &context.config.strata;

        for x in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                let mut above = BlockType::NULL;
                for y in (0..CHUNK_HEIGHT).rev() {
                    let cell = context.volume.get(x, y, z);
                    if cell != BlockType::STONE || above != BlockType::NULL {
                        above = cell;
                        continue;
                    }

                    let world_x = (context.origin.x + x) as f64;
                    let world_z = (context.origin.z + z) as f64;
                    let sample =
                        normalized(context.noise.sample([world_x, 0.0, world_z], &attributes.noise));
                    let thickness =
                        ((sample * attributes.max_thickness as f64) as i32).min(y + 1);

                    for i in 0..thickness {
                        let block = if i == 0 {
                            attributes.surface_block
                        } else {
                            attributes.filler_block
                        };
                        context.volume.set(x, y - i, z, block);
                    }
                    break;
                }
            }
        }
    }
}

/// Reserved slot for cave carving.
///
/// The pass currently leaves the volume untouched. It stays registered so
/// the phase chain has a stable slot for a carver to drop into via
/// `TerrainGenerator::with_stage`.
pub struct CaveStage;

impl GenerationStage for CaveStage {
    fn name(&self) -> &'static str {
        "caves"
    }

    fn kind(&self) -> StageKind {
        StageKind::Caves
    }

    fn execute(&self, _context: &StageContext<'_>) {}
}

/// Overwrites the whole volume with a thresholded 3D noise field.
///
/// Matched cells get the configured block and everything else is cleared.
/// This pass is a tuning aid: it renders an ore or cave noise configuration
/// as solid geometry so the field's shape can be inspected in isolation.
pub struct DensityMapStage;

impl GenerationStage for DensityMapStage {
    fn name(&self) -> &'static str {
        "density-map"
    }

    fn kind(&self) -> StageKind {
        StageKind::DensityMap
    }

    fn execute(&self, context: &StageContext<'_>) {
        let attributes = &context.config.density;

        for x in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_HEIGHT {
                for z in 0..CHUNK_DIMENSION {
                    let point = [
                        (context.origin.x + x) as f64 / attributes.width[0],
                        y as f64 / attributes.width[1],
                        (context.origin.z + z) as f64 / attributes.width[2],
                    ];
                    let sample = normalized(context.noise.sample(point, &attributes.noise));
                    let matched = if attributes.inverted {
                        sample > attributes.density
                    } else {
                        sample < attributes.density
                    };

                    let block = if matched { attributes.block } else { BlockType::NULL };
                    context.volume.set(x, y, z, block);
                }
            }
        }
    }
}

/// Seeds mineral veins inside stone.
///
/// Only stone cells are candidates. Each configured ore is tried in order
/// and the first one whose density field matches claims the cell; cells that
/// match nothing stay stone. An ore's height limit excludes it from cells
/// above that world height without removing deeper ores from consideration.
pub struct OreStage;

impl GenerationStage for OreStage {
    fn name(&self) -> &'static str {
        "ores"
    }

    fn kind(&self) -> StageKind {
        StageKind::Ores
    }

    fn execute(&self, context: &StageContext<'_>) {
        for x in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                for y in 0..CHUNK_HEIGHT {
                    if context.volume.get(x, y, z) != BlockType::STONE {
                        continue;
                    }

                    let world_x = (context.origin.x + x) as f64;
                    let world_z = (context.origin.z + z) as f64;

                    for ore in &context.config.ores {
                        if y > ore.height_limit {
                            continue;
                        }

                        let point = [
                            world_x / ore.width[0],
                            y as f64 / ore.width[1],
                            world_z / ore.width[2],
                        ];
                        let sample = normalized(context.noise.sample(point, &ore.noise));
                        let matched = if ore.inverted {
                            sample > ore.density
                        } else {
                            sample < ore.density
                        };

                        if matched {
                            context.volume.set(x, y, z, ore.block);
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Scatters ground cover on fertile surface blocks.
///
/// A low-frequency mask keeps plants in patches: a column is skipped when
/// both the mask sample and a jittered re-sample sit at or above the
/// threshold. Planted columns get one plant on top of their highest fertile
/// block, provided the cell above it is empty.
pub struct VegetationStage;

impl GenerationStage for VegetationStage {
    fn name(&self) -> &'static str {
        "vegetation"
    }

    fn kind(&self) -> StageKind {
        StageKind::Vegetation
    }

    fn execute(&self, context: &StageContext<'_>) {
        let attributes = &context.config.vegetation;
        let mut rng = fastrand::Rng::with_seed(context.rng_seed);

        for x in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                let world_x = (context.origin.x + x) as f64;
                let world_z = (context.origin.z + z) as f64;

                let mask =
                    normalized(context.noise.sample([world_x, 0.0, world_z], &attributes.noise));
                if mask >= attributes.threshold {
                    let jitter_x = jitter(&mut rng, attributes.jitter_range) as f64;
                    let jitter_z = jitter(&mut rng, attributes.jitter_range) as f64;
                    let retry = normalized(context.noise.sample(
                        [world_x + jitter_x, 0.0, world_z + jitter_z],
                        &attributes.noise,
                    ));
                    if retry >= attributes.threshold {
                        continue;
                    }
                }

                for y in (1..CHUNK_HEIGHT).rev() {
                    let cell = context.volume.get(x, y, z);
                    if !cell.is_fertile() {
                        continue;
                    }
                    if y + 1 < CHUNK_HEIGHT
                        && context.volume.get(x, y + 1, z) == BlockType::NULL
                    {
                        context.flora.place(
                            context.volume,
                            Point3::new(x, y + 1, z),
                            cell,
                            &mut rng,
                        );
                    }
                    break;
                }
            }
        }
    }
}

fn jitter(rng: &mut fastrand::Rng, range: i32) -> i32 {
    if range > 0 {
        rng.i32(0..range)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generation::noise_map::ConstantNoise;

    fn test_generator(config: WorldGenConfig) -> TerrainGenerator {
        TerrainGenerator::new(
            Arc::new(config),
            Arc::new(ConstantNoise(0.0)),
            Arc::new(TuftPlacer),
        )
    }

    #[test]
    fn stage_seed_separates_chunks_and_stages() {
        let origin_a = Point3::new(0, 0, 0);
        let origin_b = Point3::new(16, 0, 0);

        assert_ne!(
            stage_seed(1, origin_a, StageKind::HeightMap),
            stage_seed(1, origin_b, StageKind::HeightMap),
        );
        assert_ne!(
            stage_seed(1, origin_a, StageKind::HeightMap),
            stage_seed(1, origin_a, StageKind::Vegetation),
        );
        assert_eq!(
            stage_seed(1, origin_a, StageKind::Ores),
            stage_seed(1, origin_a, StageKind::Ores),
        );
    }

    #[test]
    fn replacing_a_stage_keeps_the_registry_size() {
        struct NoopOres;
        impl GenerationStage for NoopOres {
            fn name(&self) -> &'static str {
                "noop-ores"
            }
            fn kind(&self) -> StageKind {
                StageKind::Ores
            }
            fn execute(&self, _context: &StageContext<'_>) {}
        }

        // An ore that would claim every stone cell under the constant noise
        // source, so the no-op replacement is observable.
        let mut config = WorldGenConfig::default();
        config.ores = vec![attributes::OreAttributes {
            density: 0.9,
            ..attributes::OreAttributes::default()
        }];

        let generator = test_generator(config).with_stage(Box::new(NoopOres));
        assert_eq!(generator.stages.len(), 6);

        let volume = BlockVolume::new();
        volume.set(4, 4, 4, BlockType::STONE);
        generator.run_stage(StageKind::Ores, &volume, Point3::new(0, 0, 0));
        assert_eq!(volume.get(4, 4, 4), BlockType::STONE);
    }

    #[test]
    fn cave_stage_leaves_the_volume_untouched() {
        let generator = test_generator(WorldGenConfig::default());
        let volume = BlockVolume::new();
        volume.set(1, 2, 3, BlockType::DIRT);

        generator.run_stage(StageKind::Caves, &volume, Point3::new(0, 0, 0));

        assert_eq!(volume.get(1, 2, 3), BlockType::DIRT);
        assert_eq!(volume.get(0, 0, 0), BlockType::NULL);
    }
}
