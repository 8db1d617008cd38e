//! # Stage Job Types
//!
//! The unit of executor work and the outcome it reports back.
//!
//! ## Job Lifecycle
//! 1. The driver builds a `StageJob` from a chunk's command and submits it
//! 2. A worker calls `run()`, which checks the cancellation token and then
//!    performs the generation stage or mesh build
//! 3. The resulting `StageOutcome` travels back over a completion channel
//! 4. The driver matches the outcome against the chunk's current generation
//!    number and either applies it or discards it
//!
//! ## Ownership
//! A job owns everything it touches: an `Arc` of the volume it mutates (or a
//! snapshot it reads), shared handles to the generator and grid, and its
//! cancellation token. It never holds the chunk itself, so a chunk can be
//! torn down while its job is still running.

use std::sync::Arc;

use cgmath::Point3;

use crate::core::{CancellationToken, MtResource};
use crate::engine::generation::TerrainGenerator;
use crate::engine::meshing::buffers::ChunkMesh;
use crate::engine::meshing::FaceMesher;
use crate::engine::voxels::chunk::state::StageKind;
use crate::engine::voxels::chunk::volume::{BlockVolume, VolumeSnapshot};
use crate::engine::voxels::grid::ChunkGrid;

/// One unit of executor work, bound to a chunk and a generation number.
pub struct StageJob {
    /// Chunk coordinates of the chunk this job belongs to.
    pub chunk: Point3<i32>,
    /// The chunk's generation number at dispatch time.
    pub generation: u64,
    /// Cooperative cancellation handle; checked before the work starts.
    pub cancellation: CancellationToken,
    /// The work itself.
    pub work: JobWork,
}

/// The work a stage job performs.
pub enum JobWork {
    /// Run one generation stage against a shared volume.
    Stage {
        /// Which stage to run.
        kind: StageKind,
        /// The volume to mutate.
        volume: Arc<BlockVolume>,
        /// World-space origin of the volume.
        origin: Point3<i32>,
        /// The generator holding the stage registry.
        generator: Arc<TerrainGenerator>,
    },
    /// Build render and collision buffers from a volume snapshot.
    Mesh {
        /// The blocks to mesh, decoded at submission time.
        snapshot: VolumeSnapshot,
        /// World-space origin of the snapshot.
        origin: Point3<i32>,
        /// Cut plane height for render-face culling.
        section_level: i32,
        /// Grid handle for resolving blocks across the chunk border.
        grid: MtResource<ChunkGrid>,
    },
}

/// What a finished job reports back to the driver.
pub struct StageOutcome {
    /// Chunk coordinates the job was dispatched for.
    pub chunk: Point3<i32>,
    /// Generation number the job was dispatched with.
    pub generation: u64,
    /// Whether the cancellation token was set by the time the job finished.
    /// Cancelled outcomes must not be applied.
    pub cancelled: bool,
    /// The result payload.
    pub payload: OutcomePayload,
}

/// The payload of a stage outcome.
pub enum OutcomePayload {
    /// A generation stage ran to completion.
    StageDone(StageKind),
    /// A mesh build ran to completion.
    MeshBuilt(ChunkMesh),
    /// The job was cancelled before it started; nothing ran.
    Discarded,
}

impl StageJob {
    /// Executes the job on the current thread.
    ///
    /// A token that is already cancelled skips the work entirely. A token
    /// cancelled mid-run cannot stop the work, but it marks the outcome so
    /// the driver drops it on receipt.
    pub fn run(self) -> StageOutcome {
        if self.cancellation.is_cancelled() {
            return StageOutcome {
                chunk: self.chunk,
                generation: self.generation,
                cancelled: true,
                payload: OutcomePayload::Discarded,
            };
        }

        let payload = match self.work {
            JobWork::Stage {
                kind,
                volume,
                origin,
                generator,
            } => {
                generator.run_stage(kind, &volume, origin);
                OutcomePayload::StageDone(kind)
            }
            JobWork::Mesh {
                snapshot,
                origin,
                section_level,
                grid,
            } => {
                let mesh = FaceMesher::build(&snapshot, origin, section_level, &grid);
                OutcomePayload::MeshBuilt(mesh)
            }
        };

        StageOutcome {
            chunk: self.chunk,
            generation: self.generation,
            cancelled: self.cancellation.is_cancelled(),
            payload,
        }
    }
}
