//! # Face Meshing System
//!
//! Turns a chunk's block volume into render and collision geometry.
//!
//! ## Culling
//!
//! A face is emitted only where a block meets a transparent neighbor, so
//! buried geometry costs nothing. Interior neighbors are answered by the
//! volume snapshot's transparency bits; neighbors beyond the chunk border go
//! through a `NeighborQuery`, which resolves blocks in adjacent chunks (and
//! treats unloaded space as empty, so seams heal when the neighbor arrives
//! and re-meshes).
//!
//! ## Section Plane
//!
//! The mesher supports slicing the world at a horizontal level: render faces
//! are only emitted below `section_level`, and blocks the plane cuts through
//! get a flattened-stone cap so the cut reads as a surface. Collision faces
//! ignore the plane entirely, which keeps sliced terrain walkable.
//!
//! ## Decorative Blocks
//!
//! Blocks that are not full cubes (tall grass, flowers, saplings) mesh as two
//! crossed quads when any of their six neighbors is transparent, and they
//! contribute no collision geometry.

pub mod buffers;
pub mod upload;

use cgmath::Point3;

use crate::engine::voxels::block::block_side::BlockSide;
use crate::engine::voxels::block::block_type::BlockType;
use crate::engine::voxels::block::{cross_tile, face_tile, tiles, TileId};
use crate::engine::voxels::chunk::volume::{
    BlockVolume, VolumeSnapshot, CHUNK_DIMENSION, CHUNK_HEIGHT,
};
use crate::engine::voxels::grid::NeighborQuery;
use buffers::{ChunkMesh, MeshBuffers, Vertex};

/// Builds chunk meshes from volume snapshots.
pub struct FaceMesher;

impl FaceMesher {
    /// Walks one chunk and emits its visible faces.
    ///
    /// # Arguments
    /// * `snapshot` - The chunk's blocks, decoded at job submission time
    /// * `origin` - World-space position of the chunk's (0, 0, 0) corner
    /// * `section_level` - Height at and above which render faces are hidden
    /// * `neighbors` - Resolver for blocks beyond the chunk border
    ///
    /// # Returns
    /// The finished render and collision buffers for the chunk.
    pub fn build<N: NeighborQuery>(
        snapshot: &VolumeSnapshot,
        origin: Point3<i32>,
        section_level: i32,
        neighbors: &N,
    ) -> ChunkMesh {
        let mut mesh = ChunkMesh::default();

        for x in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_HEIGHT {
                for z in 0..CHUNK_DIMENSION {
                    let cell = snapshot.block_at(x, y, z);
                    if cell == BlockType::NULL {
                        continue;
                    }

                    let local = Point3::new(x, y, z);
                    let under_section = y < section_level;

                    if cell.is_not_block() {
                        // One open side is enough for a cross-plane to show.
                        if under_section && any_side_open(snapshot, origin, neighbors, local) {
                            push_cross(&mut mesh.render, local, cross_tile(cell));
                        }
                        continue;
                    }

                    if y == section_level - 1 {
                        push_render_face(
                            &mut mesh.render,
                            local,
                            BlockSide::TOP,
                            tiles::STONE_FLATTEN,
                        );
                    }

                    for side in BlockSide::all() {
                        if !side_open(snapshot, origin, neighbors, local, side) {
                            continue;
                        }
                        if under_section {
                            push_render_face(&mut mesh.render, local, side, face_tile(cell, side));
                        }
                        mesh.collision.push_face(face_corners(local, side));
                    }
                }
            }
        }

        mesh
    }
}

/// Whether the cell beside `local` on `side` is transparent.
fn side_open<N: NeighborQuery>(
    snapshot: &VolumeSnapshot,
    origin: Point3<i32>,
    neighbors: &N,
    local: Point3<i32>,
    side: BlockSide,
) -> bool {
    let offset = side.offset();
    let x = local.x + offset.x;
    let y = local.y + offset.y;
    let z = local.z + offset.z;

    if BlockVolume::contains(x, y, z) {
        snapshot.is_transparent(x, y, z)
    } else {
        let world = Point3::new(origin.x + x, origin.y + y, origin.z + z);
        neighbors.block_at(world).is_transparent()
    }
}

fn any_side_open<N: NeighborQuery>(
    snapshot: &VolumeSnapshot,
    origin: Point3<i32>,
    neighbors: &N,
    local: Point3<i32>,
) -> bool {
    BlockSide::all()
        .into_iter()
        .any(|side| side_open(snapshot, origin, neighbors, local, side))
}

/// The four corners of one block face, ordered lower-left, lower-right,
/// upper-left, upper-right.
///
/// Corner placement fixes the winding: with the shared quad index pattern the
/// two triangles wind counter-clockwise seen from outside the block.
fn face_corners(local: Point3<i32>, side: BlockSide) -> [Point3<i32>; 4] {
    let Point3 { x, y, z } = local;
    match side {
        BlockSide::EAST => [
            (x + 1, y, z + 1),
            (x + 1, y, z),
            (x + 1, y + 1, z + 1),
            (x + 1, y + 1, z),
        ],
        BlockSide::TOP => [
            (x, y + 1, z),
            (x, y + 1, z + 1),
            (x + 1, y + 1, z),
            (x + 1, y + 1, z + 1),
        ],
        BlockSide::NORTH => [
            (x, y, z + 1),
            (x + 1, y, z + 1),
            (x, y + 1, z + 1),
            (x + 1, y + 1, z + 1),
        ],
        BlockSide::WEST => [
            (x, y, z),
            (x, y, z + 1),
            (x, y + 1, z),
            (x, y + 1, z + 1),
        ],
        BlockSide::BOTTOM => [
            (x, y, z + 1),
            (x, y, z),
            (x + 1, y, z + 1),
            (x + 1, y, z),
        ],
        BlockSide::SOUTH => [
            (x + 1, y, z),
            (x, y, z),
            (x + 1, y + 1, z),
            (x, y + 1, z),
        ],
    }
    .map(|(x, y, z)| Point3::new(x, y, z))
}

/// The two crossed quads of a decorative block, spanning its diagonals.
fn cross_corners(local: Point3<i32>) -> [[Point3<i32>; 4]; 2] {
    let Point3 { x, y, z } = local;
    [
        [
            (x, y, z),
            (x + 1, y, z + 1),
            (x, y + 1, z),
            (x + 1, y + 1, z + 1),
        ],
        [
            (x + 1, y, z),
            (x, y, z + 1),
            (x + 1, y + 1, z),
            (x, y + 1, z + 1),
        ],
    ]
    .map(|quad| quad.map(|(x, y, z)| Point3::new(x, y, z)))
}

fn push_render_face(render: &mut MeshBuffers, local: Point3<i32>, side: BlockSide, tile: TileId) {
    let [ll, lr, ul, ur] = face_corners(local, side);
    render.push_face([
        Vertex::new(ll, tile, 0, 1),
        Vertex::new(lr, tile, 1, 1),
        Vertex::new(ul, tile, 0, 0),
        Vertex::new(ur, tile, 1, 0),
    ]);
}

fn push_cross(render: &mut MeshBuffers, local: Point3<i32>, tile: TileId) {
    for [ll, lr, ul, ur] in cross_corners(local) {
        render.push_face([
            Vertex::new(ll, tile, 0, 1),
            Vertex::new(lr, tile, 1, 1),
            Vertex::new(ul, tile, 0, 0),
            Vertex::new(ur, tile, 1, 0),
        ]);
    }
}
