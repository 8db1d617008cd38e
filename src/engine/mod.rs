//! # World Engine
//!
//! The driver that owns the chunk grid, the stage executor, and the terrain
//! generator, and advances every chunk's pipeline from empty volume to
//! uploaded mesh.
//!
//! ## Tick Protocol
//!
//! `WorldEngine::tick` runs one driver step:
//! 1. Drain finished job outcomes and apply them to their chunks (advance
//!    the state machine, stage mesh buffers), discarding outcomes whose
//!    generation number no longer matches or whose job was cancelled
//! 2. Tick every chunk's state machine and execute the command it returns:
//!    launch a generation stage, launch a face build, or finalize the staged
//!    mesh into the chunk and the upload sink
//! 3. Promote queued jobs onto freed workers
//!
//! Chunks whose worker never reports back are detected by the stuck timeout
//! and relaunched; the orphaned outcome is fenced off by the chunk's
//! generation counter.
//!
//! ## Streaming
//!
//! `stream_in` loads a square of chunks around a focus position and
//! `stream_out`/`stream_out_beyond` tear chunks down, cancelling their
//! in-flight workers. A removed chunk's jobs finish against their own volume
//! handle and report into the void.

pub mod generation;
pub mod meshing;
pub mod stage_executor;
pub mod voxels;

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info, warn};

use crate::core::MtResource;
use generation::attributes::WorldGenConfig;
use generation::TerrainGenerator;
use meshing::upload::MeshUpload;
use stage_executor::job::{JobWork, OutcomePayload, StageJob, StageOutcome};
use stage_executor::StageExecutor;
use voxels::chunk::state::{ChunkCommand, ChunkState};
use voxels::chunk::Chunk;
use voxels::grid::ChunkGrid;

/// Aggregate mesh counters across all loaded chunks.
#[derive(Copy, Clone, Debug, Default)]
pub struct MeshStatistics {
    /// Loaded chunks.
    pub chunks: usize,
    /// Chunks with a finalized mesh.
    pub meshed_chunks: usize,
    /// Total render quads across finalized meshes.
    pub render_faces: u64,
    /// Total collision quads across finalized meshes.
    pub collision_faces: u64,
}

/// Owns and drives the whole terrain pipeline.
///
/// # Fields
/// - `grid`: The loaded chunks, shared with meshing workers for neighbor
///   lookups
/// - `executor`: Worker pool and detached dispatch for stage jobs
/// - `generator`: Stage registry shared by every generation job
/// - `upload`: Sink that receives finalized meshes
/// - `section_level`: Current cut plane, applied to newly loaded chunks
pub struct WorldEngine {
    grid: MtResource<ChunkGrid>,
    executor: StageExecutor,
    generator: Arc<TerrainGenerator>,
    config: Arc<WorldGenConfig>,
    upload: Box<dyn MeshUpload>,
    section_level: i32,
    stuck_timeout: Duration,
}

impl WorldEngine {
    /// Creates an engine from a configuration, a generator, and an upload
    /// sink.
    ///
    /// In pooled dispatch the worker count is clamped to at least one; with
    /// `detached_dispatch` set, no pool threads are created at all.
    pub fn new(
        config: Arc<WorldGenConfig>,
        generator: Arc<TerrainGenerator>,
        upload: Box<dyn MeshUpload>,
    ) -> Self {
        let workers = if config.detached_dispatch {
            0
        } else {
            config.workers.max(1)
        };

        WorldEngine {
            grid: MtResource::new(ChunkGrid::new()),
            executor: StageExecutor::new(workers),
            generator,
            upload,
            section_level: config.section_level,
            stuck_timeout: Duration::from_millis(config.stuck_timeout_ms),
            config,
        }
    }

    /// A shared handle to the chunk grid.
    pub fn grid(&self) -> MtResource<ChunkGrid> {
        self.grid.clone()
    }

    /// The current section level.
    pub fn section_level(&self) -> i32 {
        self.section_level
    }

    /// Loads every missing chunk in a square of the given radius around a
    /// center, in chunk coordinates.
    pub fn stream_in(&mut self, center: Point3<i32>, radius: i32) {
        let debug_start = if self.config.debug_mode {
            self.config.debug_start_state
        } else {
            None
        };

        let mut loaded = 0;
        {
            let mut grid = self.grid.get_mut();
            for x in (center.x - radius)..=(center.x + radius) {
                for z in (center.z - radius)..=(center.z + radius) {
                    let position = Point3::new(x, 0, z);
                    if grid.chunk_at(position).is_none() {
                        grid.insert(Chunk::new(position, self.section_level, debug_start));
                        loaded += 1;
                    }
                }
            }
        }

        if loaded > 0 {
            info!(
                "Streamed in {} chunks around {:?} (radius {})",
                loaded, center, radius
            );
        }
    }

    /// Unloads the chunk at the given chunk coordinates, cancelling its
    /// in-flight worker.
    pub fn stream_out(&mut self, position: Point3<i32>) {
        let removed = self.grid.get_mut().remove(position);
        if let Some(chunk) = removed {
            chunk.get().cancel_workers();
            debug!("Streamed out chunk at {:?}", position);
        }
    }

    /// Unloads every chunk outside a square of the given radius around a
    /// center.
    pub fn stream_out_beyond(&mut self, center: Point3<i32>, radius: i32) {
        let positions = self.grid.get().positions();
        for position in positions {
            if (position.x - center.x).abs() > radius || (position.z - center.z).abs() > radius {
                self.stream_out(position);
            }
        }
    }

    /// Moves the section cut plane.
    ///
    /// Idle chunks re-mesh immediately; chunks with a worker in flight pick
    /// the change up when their current work completes.
    pub fn set_section_level(&mut self, level: i32) {
        if self.section_level == level {
            return;
        }
        info!("Section level changed to {}", level);
        self.section_level = level;

        for handle in self.chunk_handles() {
            let mut chunk = handle.get_mut();
            chunk.section_level = level;
            if !chunk.machine.request(ChunkState::NeedFaceUpdate) {
                chunk.pending_face_refresh = true;
            }
        }
    }

    /// Runs one driver step. See the module documentation for the protocol.
    pub fn tick(&mut self) {
        for outcome in self.executor.drain_outcomes() {
            self.apply_outcome(outcome);
        }

        for handle in self.chunk_handles() {
            let mut chunk = handle.get_mut();

            if chunk.pending_face_refresh && chunk.machine.request(ChunkState::NeedFaceUpdate) {
                chunk.pending_face_refresh = false;
            }

            if chunk.machine.stuck_for(self.stuck_timeout) {
                warn!(
                    "Chunk at {:?} has been updating for over {:?}; relaunching",
                    chunk.position, self.stuck_timeout
                );
                chunk.invalidate_jobs();
                chunk.machine.recover();
            }

            if let Some(command) = chunk.machine.tick() {
                self.execute_command(&mut chunk, command);
            }
        }

        self.executor.process_queued_jobs();
    }

    /// Whether every chunk has settled and no job is running or queued.
    pub fn is_settled(&self) -> bool {
        if !self.executor.is_idle() {
            return false;
        }
        self.chunk_handles()
            .iter()
            .all(|handle| handle.get().machine.is_settled())
    }

    /// Sums mesh sizes across loaded chunks.
    pub fn mesh_statistics(&self) -> MeshStatistics {
        let mut statistics = MeshStatistics::default();
        for handle in self.chunk_handles() {
            let chunk = handle.get();
            statistics.chunks += 1;
            if let Some(mesh) = &chunk.mesh {
                statistics.meshed_chunks += 1;
                statistics.render_faces += mesh.render.face_count() as u64;
                statistics.collision_faces += mesh.collision.face_count() as u64;
            }
        }
        statistics
    }

    fn chunk_handles(&self) -> Vec<MtResource<Chunk>> {
        let grid = self.grid.get();
        grid.positions()
            .into_iter()
            .filter_map(|position| grid.chunk_at(position))
            .collect()
    }

    fn execute_command(&mut self, chunk: &mut Chunk, command: ChunkCommand) {
        match command {
            ChunkCommand::LaunchStage(kind) => {
                let job = StageJob {
                    chunk: chunk.position,
                    generation: chunk.next_generation(),
                    cancellation: chunk.cancellation(),
                    work: JobWork::Stage {
                        kind,
                        volume: Arc::clone(&chunk.volume),
                        origin: chunk.origin(),
                        generator: Arc::clone(&self.generator),
                    },
                };
                self.dispatch_job(job);
            }
            ChunkCommand::BuildFaces => {
                let job = StageJob {
                    chunk: chunk.position,
                    generation: chunk.next_generation(),
                    cancellation: chunk.cancellation(),
                    work: JobWork::Mesh {
                        snapshot: chunk.volume.snapshot(),
                        origin: chunk.origin(),
                        section_level: chunk.section_level,
                        grid: self.grid.clone(),
                    },
                };
                self.dispatch_job(job);
            }
            ChunkCommand::FinalizeMesh => {
                match chunk.staged_mesh.take() {
                    Some(mesh) => {
                        self.upload
                            .upload(chunk.origin(), &mesh.render, &mesh.collision);
                        chunk.mesh = Some(mesh);
                    }
                    None => {
                        // Can happen when recovery relaunched a face build
                        // whose original worker had already delivered.
                        warn!(
                            "Chunk at {:?} reached finalize with no staged mesh",
                            chunk.position
                        );
                    }
                }
                chunk.machine.complete_finalize();
            }
        }
    }

    fn dispatch_job(&mut self, job: StageJob) {
        if self.config.detached_dispatch {
            self.executor.submit_detached(job);
        } else {
            self.executor.submit(job);
        }
    }

    fn apply_outcome(&mut self, outcome: StageOutcome) {
        let handle = {
            let grid = self.grid.get();
            grid.chunk_at(outcome.chunk)
        };
        let handle = match handle {
            Some(handle) => handle,
            None => {
                debug!("Dropping outcome for unloaded chunk at {:?}", outcome.chunk);
                return;
            }
        };

        let mut chunk = handle.get_mut();
        if outcome.cancelled || !chunk.matches_generation(outcome.generation) {
            debug!(
                "Discarding stale outcome for chunk at {:?} (generation {})",
                outcome.chunk, outcome.generation
            );
            return;
        }

        match outcome.payload {
            OutcomePayload::StageDone(kind) => {
                debug!("Chunk at {:?} completed {:?}", outcome.chunk, kind);
                chunk.machine.complete_stage(kind);
            }
            OutcomePayload::MeshBuilt(mesh) => {
                chunk.staged_mesh = Some(mesh);
                chunk.machine.complete_faces();
            }
            OutcomePayload::Discarded => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generation::noise_map::ConstantNoise;
    use crate::engine::generation::TuftPlacer;
    use crate::engine::meshing::upload::LoggingUpload;

    fn test_engine() -> WorldEngine {
        let config = Arc::new(WorldGenConfig::default());
        let generator = TerrainGenerator::new(
            Arc::clone(&config),
            Arc::new(ConstantNoise(0.0)),
            Arc::new(TuftPlacer),
        );
        WorldEngine::new(config, Arc::new(generator), Box::new(LoggingUpload))
    }

    #[test]
    fn streaming_loads_a_square_and_prunes_outside_it() {
        let mut engine = test_engine();
        engine.stream_in(Point3::new(0, 0, 0), 1);
        assert_eq!(engine.grid().get().len(), 9);

        // Streaming the same square again adds nothing.
        engine.stream_in(Point3::new(0, 0, 0), 1);
        assert_eq!(engine.grid().get().len(), 9);

        engine.stream_out_beyond(Point3::new(0, 0, 0), 0);
        assert_eq!(engine.grid().get().len(), 1);
        assert!(engine
            .grid()
            .get()
            .chunk_at(Point3::new(0, 0, 0))
            .is_some());
    }

    #[test]
    fn section_change_marks_busy_chunks_for_refresh() {
        let mut engine = test_engine();
        engine.stream_in(Point3::new(0, 0, 0), 0);

        // Put the chunk's machine into Updating by hand, as if a worker were
        // in flight.
        let handle = engine.grid().get().chunk_at(Point3::new(0, 0, 0));
        if let Some(handle) = &handle {
            handle.get_mut().machine.tick();
        }

        engine.set_section_level(64);
        if let Some(handle) = &handle {
            let chunk = handle.get();
            assert_eq!(chunk.section_level, 64);
            assert!(chunk.pending_face_refresh);
        }
    }
}
