//! # Chunk Module
//!
//! The `Chunk` aggregate: one 16x256x16 block volume, the state machine that
//! sequences its generation, and the most recent finalized mesh.
//!
//! A chunk is the unit of world streaming. The grid creates one when a cell
//! streams in, the driver ticks it until the machine settles, and teardown
//! cancels whatever worker is still in flight. Worker jobs never hold the
//! chunk itself; they hold an `Arc` of its volume plus a generation number so
//! the driver can discard outcomes from workers the chunk has since outgrown.

use std::sync::Arc;

use cgmath::Point3;

use crate::core::CancellationToken;
use crate::engine::meshing::buffers::ChunkMesh;

use self::state::{ChunkState, ChunkStateMachine};
use self::volume::{BlockVolume, CHUNK_DIMENSION};

pub mod state;
pub mod volume;

/// One streamed-in cell of the world.
///
/// The mesh fields hold two copies on purpose: `staged_mesh` receives the
/// buffers a meshing worker produced, and `mesh` only changes when the
/// finalize step swaps the staged buffers in. Readers of `mesh` therefore
/// never observe a partially built result.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    /// The block storage, shared with whichever worker is generating it.
    pub volume: Arc<BlockVolume>,

    /// The state machine sequencing this chunk's pipeline.
    pub machine: ChunkStateMachine,

    /// The most recently finalized mesh, if any.
    pub mesh: Option<ChunkMesh>,

    /// Mesh buffers delivered by a face-building worker, awaiting finalize.
    pub staged_mesh: Option<ChunkMesh>,

    /// The horizontal cut height this chunk was last meshed against.
    pub section_level: i32,

    /// Set when a section-level change arrived while a worker was in flight;
    /// the driver re-requests the face update once the worker completes.
    pub pending_face_refresh: bool,

    generation: u64,
    cancellation: CancellationToken,
}

impl Chunk {
    /// Creates a chunk at the given chunk coordinates.
    ///
    /// # Arguments
    /// * `position` - Chunk coordinates; world origin is `position * 16` on x/z
    /// * `section_level` - The cut plane height to mesh against
    /// * `debug_start` - Optional forced start state; suppresses stage chaining
    pub fn new(
        position: Point3<i32>,
        section_level: i32,
        debug_start: Option<ChunkState>,
    ) -> Self {
        let machine = match debug_start {
            Some(state) => ChunkStateMachine::with_start_state(state),
            None => ChunkStateMachine::new(),
        };
        Chunk {
            position,
            volume: Arc::new(BlockVolume::new()),
            machine,
            mesh: None,
            staged_mesh: None,
            section_level,
            pending_face_refresh: false,
            generation: 0,
            cancellation: CancellationToken::new(),
        }
    }

    /// The world-space block coordinate of this chunk's origin corner.
    pub fn origin(&self) -> Point3<i32> {
        Point3::new(
            self.position.x * CHUNK_DIMENSION,
            0,
            self.position.z * CHUNK_DIMENSION,
        )
    }

    /// Returns a token that workers check for cooperative cancellation.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Cancels any in-flight worker. Called at teardown; the workers finish
    /// against their own volume handle and their outcomes are discarded.
    pub fn cancel_workers(&self) {
        self.cancellation.cancel();
    }

    /// Stamps out a fresh generation number for the next dispatched job.
    ///
    /// Outcomes are only applied when their generation matches, which is how
    /// the driver ignores workers that were abandoned by stuck recovery.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Invalidates all outstanding jobs without dispatching a new one.
    pub fn invalidate_jobs(&mut self) {
        self.generation += 1;
    }

    /// Whether an outcome's generation belongs to the current job.
    pub fn matches_generation(&self, generation: u64) -> bool {
        self.generation == generation
    }
}
