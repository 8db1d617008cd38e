//! # Chunk State Machine Module
//!
//! The per-chunk finite-state machine that sequences generation stages, face
//! building, and mesh finalization.
//!
//! ## Phase and State
//!
//! A chunk tracks two levels of progress. `ChunkPhase` is the coarse milestone
//! and only ever moves forward. `ChunkState` is the fine-grained execution
//! status within a phase and can revisit the face/mesh states many times, for
//! example when the section level changes after generation has finished.
//!
//! ## Driving the Machine
//!
//! The machine never performs work itself. The driver calls `tick` once per
//! frame per chunk; when something should happen, `tick` returns the command
//! to execute (launch a stage worker, build faces, finalize the mesh) and
//! parks the machine in `Updating`. When the work finishes, the driver reports
//! it through one of the `complete_*` methods, which advance the phase and
//! select the next state.
//!
//! `Updating` doubles as the mutual-exclusion guard around the block volume:
//! while the machine is `Updating`, every `request` is rejected and `tick`
//! issues nothing, so a chunk can never have two workers mutating it at once.

use std::time::{Duration, Instant};

use serde::Deserialize;

/// Coarse generation milestone for a chunk.
///
/// Advances monotonically from `Init` to `Generated` and never regresses.
/// Each value names the next stage family that must complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChunkPhase {
    /// Fresh chunk, nothing dispatched yet.
    Init,
    /// Height-map synthesis is the next milestone.
    HeightMap,
    /// Strata deposition is the next milestone.
    Strata,
    /// Cave carving is the next milestone.
    Caves,
    /// Ore placement is the next milestone.
    OreGeneration,
    /// Vegetation scattering is the next milestone.
    Vegetation,
    /// All generation stages have completed.
    Generated,
}

/// Fine-grained execution status of a chunk.
///
/// The stage states mark which stage should be launched next; `Updating`
/// means a worker is in flight; `NeedFaceUpdate` and `NeedMeshUpdate` chain
/// the meshing steps after every volume mutation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum ChunkState {
    /// Nothing to do.
    Idle,
    /// The height-map stage should be launched.
    HeightMapGeneration,
    /// The strata stage should be launched.
    StrataGeneration,
    /// The cave stage should be launched.
    CaveGeneration,
    /// The density-map debug stage should be launched.
    DensityMapGeneration,
    /// The ore stage should be launched.
    OreGeneration,
    /// The vegetation stage should be launched.
    VegetationGeneration,
    /// The volume changed; faces must be rebuilt.
    NeedFaceUpdate,
    /// A worker is in flight. All transition requests are rejected.
    Updating,
    /// Face buffers are staged; the mesh must be finalized and uploaded.
    NeedMeshUpdate,
}

/// Identifies one generation stage when dispatching work and reporting
/// completion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Height-map synthesis.
    HeightMap,
    /// Strata deposition.
    Strata,
    /// Cave carving.
    Caves,
    /// Density-map debug fill.
    DensityMap,
    /// Ore placement.
    Ores,
    /// Vegetation scattering.
    Vegetation,
}

/// A side effect the driver must execute on behalf of the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkCommand {
    /// Dispatch the given generation stage to a worker.
    LaunchStage(StageKind),
    /// Dispatch a face-building job against the current volume.
    BuildFaces,
    /// Swap the staged mesh in and push it to the upload sink.
    FinalizeMesh,
}

/// Explicit finite-state machine for one chunk.
///
/// See the module documentation for the tick/complete protocol. A machine
/// built with `new` chains stages automatically until `Generated`; one built
/// with `with_start_state` runs exactly the configured stage and then idles,
/// which is the debug-visualization flow.
#[derive(Debug)]
pub struct ChunkStateMachine {
    phase: ChunkPhase,
    state: ChunkState,
    chain: bool,
    updating_since: Option<Instant>,
}

impl ChunkStateMachine {
    /// Creates a machine ready to generate a chunk from scratch.
    pub fn new() -> Self {
        ChunkStateMachine {
            phase: ChunkPhase::Init,
            state: ChunkState::HeightMapGeneration,
            chain: true,
            updating_since: None,
        }
    }

    /// Creates a machine that starts in an arbitrary state and does not chain
    /// into later phases.
    ///
    /// Used by the debug start-state configuration to run a single stage,
    /// such as the density-map fill, in isolation.
    pub fn with_start_state(state: ChunkState) -> Self {
        ChunkStateMachine {
            phase: ChunkPhase::Init,
            state,
            chain: false,
            updating_since: None,
        }
    }

    /// The current coarse milestone.
    pub fn phase(&self) -> ChunkPhase {
        self.phase
    }

    /// The current fine-grained status.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Requests a state transition.
    ///
    /// Rejected while a worker is in flight: `Updating` is the mutual
    /// exclusion guard, and only the completion of the active work may move
    /// the machine out of it.
    ///
    /// # Returns
    /// `true` if the transition was applied, `false` if it was rejected.
    pub fn request(&mut self, state: ChunkState) -> bool {
        if self.state == ChunkState::Updating {
            return false;
        }
        self.state = state;
        self.updating_since = if state == ChunkState::Updating {
            Some(Instant::now())
        } else {
            None
        };
        true
    }

    /// Advances the machine one step and returns the command to execute.
    ///
    /// Returns `None` when there is nothing to do: the machine is `Updating`,
    /// or it is `Idle` with no further phase to chain into. Otherwise the
    /// machine moves to `Updating` and the caller must eventually report the
    /// command's completion.
    pub fn tick(&mut self) -> Option<ChunkCommand> {
        let command = match self.state {
            ChunkState::Updating => return None,
            ChunkState::Idle => {
                if !self.chain || self.phase == ChunkPhase::Generated {
                    return None;
                }
                ChunkCommand::LaunchStage(Self::stage_for_phase(self.phase)?)
            }
            ChunkState::HeightMapGeneration => ChunkCommand::LaunchStage(StageKind::HeightMap),
            ChunkState::StrataGeneration => ChunkCommand::LaunchStage(StageKind::Strata),
            ChunkState::CaveGeneration => ChunkCommand::LaunchStage(StageKind::Caves),
            ChunkState::DensityMapGeneration => ChunkCommand::LaunchStage(StageKind::DensityMap),
            ChunkState::OreGeneration => ChunkCommand::LaunchStage(StageKind::Ores),
            ChunkState::VegetationGeneration => ChunkCommand::LaunchStage(StageKind::Vegetation),
            ChunkState::NeedFaceUpdate => ChunkCommand::BuildFaces,
            ChunkState::NeedMeshUpdate => ChunkCommand::FinalizeMesh,
        };

        if command == ChunkCommand::LaunchStage(StageKind::HeightMap)
            && self.phase == ChunkPhase::Init
        {
            self.phase = ChunkPhase::HeightMap;
        }

        self.state = ChunkState::Updating;
        self.updating_since = Some(Instant::now());
        Some(command)
    }

    /// Reports that a generation stage finished.
    ///
    /// Advances the phase past the stage's milestone (the density-map debug
    /// stage advances nothing) and schedules a face rebuild. Ignored when the
    /// machine is not `Updating`, which happens if the worker outlived a
    /// recovery.
    pub fn complete_stage(&mut self, kind: StageKind) {
        if self.state != ChunkState::Updating {
            return;
        }
        if let Some(next) = Self::phase_after(kind) {
            if next > self.phase {
                self.phase = next;
            }
        }
        self.state = ChunkState::NeedFaceUpdate;
        self.updating_since = None;
    }

    /// Reports that the face-building job finished and its buffers are staged.
    pub fn complete_faces(&mut self) {
        if self.state != ChunkState::Updating {
            return;
        }
        self.state = ChunkState::NeedMeshUpdate;
        self.updating_since = None;
    }

    /// Reports that the staged mesh was swapped in and uploaded.
    pub fn complete_finalize(&mut self) {
        if self.state != ChunkState::Updating {
            return;
        }
        self.state = ChunkState::Idle;
        self.updating_since = None;
    }

    /// Whether the chunk has no further work: idle, and either fully
    /// generated or configured not to chain.
    pub fn is_settled(&self) -> bool {
        self.state == ChunkState::Idle && (!self.chain || self.phase == ChunkPhase::Generated)
    }

    /// Whether the machine has sat in `Updating` for at least `timeout`.
    ///
    /// A true result means the in-flight worker was lost or wedged; the
    /// driver should call `recover`.
    pub fn stuck_for(&self, timeout: Duration) -> bool {
        self.state == ChunkState::Updating
            && self
                .updating_since
                .map_or(false, |since| since.elapsed() >= timeout)
    }

    /// Abandons a wedged worker and re-enters the current phase's stage state
    /// so the work is relaunched.
    ///
    /// The caller must also invalidate the abandoned worker's outcome, or its
    /// late completion would be applied on top of the relaunched stage.
    pub fn recover(&mut self) {
        if self.state != ChunkState::Updating {
            return;
        }
        self.state = Self::stage_state_for(self.phase);
        self.updating_since = None;
    }

    fn stage_for_phase(phase: ChunkPhase) -> Option<StageKind> {
        match phase {
            ChunkPhase::Init | ChunkPhase::HeightMap => Some(StageKind::HeightMap),
            ChunkPhase::Strata => Some(StageKind::Strata),
            ChunkPhase::Caves => Some(StageKind::Caves),
            ChunkPhase::OreGeneration => Some(StageKind::Ores),
            ChunkPhase::Vegetation => Some(StageKind::Vegetation),
            ChunkPhase::Generated => None,
        }
    }

    fn stage_state_for(phase: ChunkPhase) -> ChunkState {
        match phase {
            ChunkPhase::Init | ChunkPhase::HeightMap => ChunkState::HeightMapGeneration,
            ChunkPhase::Strata => ChunkState::StrataGeneration,
            ChunkPhase::Caves => ChunkState::CaveGeneration,
            ChunkPhase::OreGeneration => ChunkState::OreGeneration,
            ChunkPhase::Vegetation => ChunkState::VegetationGeneration,
            // Generation already finished; the safe relaunch is a face rebuild.
            ChunkPhase::Generated => ChunkState::NeedFaceUpdate,
        }
    }

    fn phase_after(kind: StageKind) -> Option<ChunkPhase> {
        match kind {
            StageKind::HeightMap => Some(ChunkPhase::Strata),
            StageKind::Strata => Some(ChunkPhase::Caves),
            StageKind::Caves => Some(ChunkPhase::OreGeneration),
            StageKind::Ores => Some(ChunkPhase::Vegetation),
            StageKind::Vegetation => Some(ChunkPhase::Generated),
            StageKind::DensityMap => None,
        }
    }
}

impl Default for ChunkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
