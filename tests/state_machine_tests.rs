//! Integration tests for the chunk state machine: the tick/complete command
//! protocol, the `Updating` mutual-exclusion guard, phase monotonicity, and
//! stuck-worker recovery.

use std::time::Duration;

use voxel_terrain::engine::voxels::chunk::state::{
    ChunkCommand, ChunkPhase, ChunkState, ChunkStateMachine, StageKind,
};

/// Drives a machine through one full stage round: launch, face rebuild,
/// finalize.
fn complete_round(machine: &mut ChunkStateMachine, kind: StageKind) {
    assert_eq!(
        machine.tick(),
        Some(ChunkCommand::LaunchStage(kind)),
        "expected {:?} to launch",
        kind
    );
    machine.complete_stage(kind);
    assert_eq!(machine.tick(), Some(ChunkCommand::BuildFaces));
    machine.complete_faces();
    assert_eq!(machine.tick(), Some(ChunkCommand::FinalizeMesh));
    machine.complete_finalize();
}

/// Runs a fresh machine all the way to `Generated`.
fn generated_machine() -> ChunkStateMachine {
    let mut machine = ChunkStateMachine::new();
    for kind in [
        StageKind::HeightMap,
        StageKind::Strata,
        StageKind::Caves,
        StageKind::Ores,
        StageKind::Vegetation,
    ] {
        complete_round(&mut machine, kind);
    }
    machine
}

#[test]
fn fresh_machine_walks_the_full_pipeline() {
    let machine = generated_machine();

    assert_eq!(machine.phase(), ChunkPhase::Generated);
    assert_eq!(machine.state(), ChunkState::Idle);
    assert!(machine.is_settled());
}

#[test]
fn settled_machine_issues_no_commands() {
    let mut machine = generated_machine();
    assert_eq!(machine.tick(), None);
    assert_eq!(machine.tick(), None);
}

#[test]
fn every_stage_is_followed_by_a_face_rebuild() {
    let mut machine = ChunkStateMachine::new();

    machine.tick();
    machine.complete_stage(StageKind::HeightMap);

    assert_eq!(machine.state(), ChunkState::NeedFaceUpdate);
    assert_eq!(machine.phase(), ChunkPhase::Strata);
}

#[test]
fn requests_are_rejected_while_updating() {
    let mut machine = ChunkStateMachine::new();
    machine.tick();

    assert_eq!(machine.state(), ChunkState::Updating);
    assert!(!machine.request(ChunkState::NeedFaceUpdate));
    assert_eq!(machine.state(), ChunkState::Updating);
    assert_eq!(machine.tick(), None, "updating machines issue nothing");

    machine.complete_stage(StageKind::HeightMap);
    assert_eq!(machine.state(), ChunkState::NeedFaceUpdate);
}

#[test]
fn completions_apply_only_while_updating() {
    let mut machine = ChunkStateMachine::new();

    machine.complete_stage(StageKind::HeightMap);
    machine.complete_faces();
    machine.complete_finalize();

    assert_eq!(machine.state(), ChunkState::HeightMapGeneration);
    assert_eq!(machine.phase(), ChunkPhase::Init);
}

#[test]
fn phase_never_regresses() {
    let mut machine = ChunkStateMachine::new();
    complete_round(&mut machine, StageKind::HeightMap);
    complete_round(&mut machine, StageKind::Strata);
    assert_eq!(machine.phase(), ChunkPhase::Caves);

    // A stale height-map completion lands while the cave stage is in
    // flight; it may retarget the state but must not roll the phase back.
    machine.tick();
    machine.complete_stage(StageKind::HeightMap);

    assert_eq!(machine.phase(), ChunkPhase::Caves);
}

#[test]
fn forced_start_state_runs_once_and_idles() {
    let mut machine = ChunkStateMachine::with_start_state(ChunkState::DensityMapGeneration);

    assert_eq!(
        machine.tick(),
        Some(ChunkCommand::LaunchStage(StageKind::DensityMap))
    );
    machine.complete_stage(StageKind::DensityMap);
    assert_eq!(machine.phase(), ChunkPhase::Init, "debug stages advance no phase");

    assert_eq!(machine.tick(), Some(ChunkCommand::BuildFaces));
    machine.complete_faces();
    assert_eq!(machine.tick(), Some(ChunkCommand::FinalizeMesh));
    machine.complete_finalize();

    assert_eq!(machine.tick(), None, "no chaining into later stages");
    assert!(machine.is_settled());
}

#[test]
fn section_refresh_reruns_the_mesh_path() {
    let mut machine = generated_machine();

    assert!(machine.request(ChunkState::NeedFaceUpdate));
    assert_eq!(machine.tick(), Some(ChunkCommand::BuildFaces));
    machine.complete_faces();
    assert_eq!(machine.tick(), Some(ChunkCommand::FinalizeMesh));
    machine.complete_finalize();

    assert_eq!(machine.phase(), ChunkPhase::Generated);
    assert!(machine.is_settled());
}

#[test]
fn stuck_detection_requires_updating() {
    let mut machine = ChunkStateMachine::new();
    assert!(!machine.stuck_for(Duration::ZERO));

    machine.tick();
    assert!(machine.stuck_for(Duration::ZERO));
    assert!(!machine.stuck_for(Duration::from_secs(3600)));
}

#[test]
fn recovery_relaunches_the_current_phase() {
    let mut machine = ChunkStateMachine::new();
    machine.tick();

    machine.recover();

    assert_eq!(machine.state(), ChunkState::HeightMapGeneration);
    assert_eq!(
        machine.tick(),
        Some(ChunkCommand::LaunchStage(StageKind::HeightMap))
    );
}

#[test]
fn recovery_after_generation_rebuilds_faces() {
    let mut machine = generated_machine();
    machine.request(ChunkState::NeedFaceUpdate);
    machine.tick();

    machine.recover();

    assert_eq!(machine.state(), ChunkState::NeedFaceUpdate);
    assert_eq!(machine.tick(), Some(ChunkCommand::BuildFaces));
}

#[test]
fn recovery_outside_updating_is_a_no_op() {
    let mut machine = ChunkStateMachine::new();
    machine.recover();
    assert_eq!(machine.state(), ChunkState::HeightMapGeneration);

    let mut machine = generated_machine();
    machine.recover();
    assert_eq!(machine.state(), ChunkState::Idle);
}
