//! Integration tests for the face mesher: culling, the section plane,
//! decorative cross blocks, and buffer layout.

use cgmath::Point3;

use voxel_terrain::engine::meshing::buffers::{face_indices, ChunkMesh};
use voxel_terrain::engine::meshing::FaceMesher;
use voxel_terrain::engine::voxels::block::block_type::BlockType;
use voxel_terrain::engine::voxels::block::tiles;
use voxel_terrain::engine::voxels::chunk::volume::{BlockVolume, CHUNK_HEIGHT};
use voxel_terrain::engine::voxels::grid::NeighborQuery;

/// A neighborhood with nothing in it.
struct OpenWorld;

impl NeighborQuery for OpenWorld {
    fn block_at(&self, _position: Point3<i32>) -> BlockType {
        BlockType::NULL
    }
}

/// Solid stone just west of the chunk, open everywhere else.
struct WestWall;

impl NeighborQuery for WestWall {
    fn block_at(&self, position: Point3<i32>) -> BlockType {
        if position.x == -1 {
            BlockType::STONE
        } else {
            BlockType::NULL
        }
    }
}

fn mesh(volume: &BlockVolume, section_level: i32) -> ChunkMesh {
    FaceMesher::build(
        &volume.snapshot(),
        Point3::new(0, 0, 0),
        section_level,
        &OpenWorld,
    )
}

#[test]
fn empty_volume_produces_no_faces() {
    let volume = BlockVolume::new();
    let mesh = mesh(&volume, CHUNK_HEIGHT);

    assert!(mesh.render.is_empty());
    assert!(mesh.collision.is_empty());
}

#[test]
fn lone_block_exposes_all_six_faces() {
    let volume = BlockVolume::new();
    volume.set(8, 100, 8, BlockType::STONE);

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    assert_eq!(mesh.render.face_count(), 6);
    assert_eq!(mesh.collision.face_count(), 6);
    assert_eq!(mesh.render.vertices.len(), 24);
    assert_eq!(mesh.render.indices.len(), 36);
}

#[test]
fn touching_blocks_cull_their_shared_faces() {
    let volume = BlockVolume::new();
    volume.set(8, 100, 8, BlockType::STONE);
    volume.set(9, 100, 8, BlockType::STONE);

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    assert_eq!(mesh.render.face_count(), 10);
    assert_eq!(mesh.collision.face_count(), 10);
}

#[test]
fn solid_cube_renders_only_its_shell() {
    let volume = BlockVolume::new();
    for x in 4..7 {
        for y in 100..103 {
            for z in 4..7 {
                volume.set(x, y, z, BlockType::STONE);
            }
        }
    }

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    // A 3x3x3 cube has 9 visible faces on each of its 6 sides.
    assert_eq!(mesh.render.face_count(), 54);
    assert_eq!(mesh.collision.face_count(), 54);
}

#[test]
fn blocks_above_the_section_level_render_nothing() {
    let volume = BlockVolume::new();
    volume.set(8, 40, 8, BlockType::STONE);

    let mesh = mesh(&volume, 40);

    assert_eq!(mesh.render.face_count(), 0);
    assert_eq!(mesh.collision.face_count(), 6);
}

#[test]
fn cap_row_gets_the_flattened_stone_face() {
    let volume = BlockVolume::new();
    volume.set(8, 39, 8, BlockType::STONE);

    let mesh = mesh(&volume, 40);

    // Six regular faces plus the unconditional cut-plane cap.
    assert_eq!(mesh.render.face_count(), 7);
    assert_eq!(mesh.collision.face_count(), 6);
    assert!(mesh
        .render
        .vertices
        .iter()
        .any(|vertex| vertex.tile() == tiles::STONE_FLATTEN));
}

#[test]
fn sectioned_column_keeps_its_collision_shell() {
    let volume = BlockVolume::new();
    for y in 0..=50 {
        volume.set(8, y, 8, BlockType::STONE);
    }

    let mesh = mesh(&volume, 40);

    // Render: 4 sides x 40 buried rows, the bottom, and the cap.
    assert_eq!(mesh.render.face_count(), 162);
    // Collision: 4 sides x 51 rows, the bottom, and the true top.
    assert_eq!(mesh.collision.face_count(), 206);
    assert!(mesh
        .render
        .vertices
        .iter()
        .all(|vertex| vertex.position().y <= 40));
    assert!(mesh
        .render
        .vertices
        .iter()
        .any(|vertex| vertex.tile() == tiles::STONE_FLATTEN));
}

#[test]
fn collision_ignores_the_section_plane() {
    let volume = BlockVolume::new();
    for y in 0..=50 {
        volume.set(8, y, 8, BlockType::STONE);
    }

    let mesh = mesh(&volume, 0);

    assert_eq!(mesh.render.face_count(), 0);
    assert_eq!(mesh.collision.face_count(), 206);
}

#[test]
fn decorative_blocks_render_as_crosses() {
    let volume = BlockVolume::new();
    volume.set(4, 10, 4, BlockType::TALLGRASS);

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    assert_eq!(mesh.render.face_count(), 2);
    assert_eq!(mesh.collision.face_count(), 0);
    assert!(mesh
        .render
        .vertices
        .iter()
        .all(|vertex| vertex.tile() == tiles::TALLGRASS));
}

#[test]
fn decoratives_above_the_section_are_hidden() {
    let volume = BlockVolume::new();
    volume.set(4, 50, 4, BlockType::TALLGRASS);

    let mesh = mesh(&volume, 40);

    assert!(mesh.render.is_empty());
    assert!(mesh.collision.is_empty());
}

#[test]
fn enclosed_decoratives_are_skipped() {
    let volume = BlockVolume::new();
    volume.set(8, 8, 8, BlockType::TALLGRASS);
    volume.set(7, 8, 8, BlockType::STONE);
    volume.set(9, 8, 8, BlockType::STONE);
    volume.set(8, 7, 8, BlockType::STONE);
    volume.set(8, 9, 8, BlockType::STONE);
    volume.set(8, 8, 7, BlockType::STONE);
    volume.set(8, 8, 9, BlockType::STONE);

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    // The six enclosing stones render all of their faces (the tuft is
    // transparent to culling), but the tuft itself stays unmeshed.
    assert_eq!(mesh.render.face_count(), 36);
    assert_eq!(mesh.collision.face_count(), 36);
    assert!(mesh
        .render
        .vertices
        .iter()
        .all(|vertex| vertex.tile() != tiles::TALLGRASS));
}

#[test]
fn grass_picks_per_side_tiles() {
    let volume = BlockVolume::new();
    volume.set(8, 100, 8, BlockType::GRASS);

    let mesh = mesh(&volume, CHUNK_HEIGHT);

    let count = |tile| {
        mesh.render
            .vertices
            .iter()
            .filter(|vertex| vertex.tile() == tile)
            .count()
    };
    assert_eq!(count(tiles::GRASS_TOP), 4);
    assert_eq!(count(tiles::DIRT), 4);
    assert_eq!(count(tiles::GRASS_SIDE), 16);
}

#[test]
fn chunk_borders_consult_the_neighbor_query() {
    let volume = BlockVolume::new();
    volume.set(0, 10, 8, BlockType::STONE);
    let snapshot = volume.snapshot();

    let open = FaceMesher::build(&snapshot, Point3::new(0, 0, 0), CHUNK_HEIGHT, &OpenWorld);
    assert_eq!(open.render.face_count(), 6);

    let walled = FaceMesher::build(&snapshot, Point3::new(0, 0, 0), CHUNK_HEIGHT, &WestWall);
    assert_eq!(walled.render.face_count(), 5);
    assert_eq!(walled.collision.face_count(), 5);
}

#[test]
fn buffers_stay_in_lockstep() {
    let volume = BlockVolume::new();
    volume.set(8, 100, 8, BlockType::STONE);

    let mesh = mesh(&volume, CHUNK_HEIGHT);
    let faces = mesh.render.face_count() as usize;

    assert_eq!(mesh.render.vertices.len(), 4 * faces);
    assert_eq!(mesh.render.indices.len(), 6 * faces);
    assert_eq!(&mesh.render.indices[0..6], &face_indices(0));
    assert_eq!(&mesh.render.indices[12..18], &face_indices(2));
    assert_eq!(face_indices(2), [8, 9, 11, 8, 11, 10]);

    // Corner order is lower-left, lower-right, upper-left, upper-right.
    assert_eq!(mesh.render.vertices[0].tex_coords(), [0.0, 1.0]);
    assert_eq!(mesh.render.vertices[1].tex_coords(), [1.0, 1.0]);
    assert_eq!(mesh.render.vertices[2].tex_coords(), [0.0, 0.0]);
    assert_eq!(mesh.render.vertices[3].tex_coords(), [1.0, 0.0]);
}
