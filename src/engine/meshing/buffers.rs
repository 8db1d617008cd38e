//! # Mesh Buffer Module
//!
//! CPU-side geometry containers filled by the face mesher. The render buffer
//! carries textured vertices ready for upload; the collider buffer carries
//! bare corner positions for physics, which keeps hidden-but-solid geometry
//! walkable without textures.

use bytemuck::{Pod, Zeroable};
use cgmath::Point3;

use crate::engine::voxels::block::TileId;

/// One render vertex, laid out for direct GPU upload.
///
/// Positions are integer block corners; the texture tile travels per vertex
/// so a face's tile can be resolved in the shader without per-face uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    x: i32,
    y: i32,
    z: i32,
    tile: u32,
    tex_coords: [f32; 2],
}

impl Vertex {
    /// Creates a vertex at a block corner with a tile and corner UV.
    pub fn new(position: Point3<i32>, tile: TileId, u: u8, v: u8) -> Self {
        Vertex {
            x: position.x,
            y: position.y,
            z: position.z,
            tile,
            tex_coords: [u as f32, v as f32],
        }
    }

    /// The vertex position as a point.
    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.x, self.y, self.z)
    }

    /// The texture atlas tile this vertex samples.
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// The UV coordinates within the tile.
    pub fn tex_coords(&self) -> [f32; 2] {
        self.tex_coords
    }
}

/// The index pattern for one quad: two triangles over four vertices.
pub fn face_indices(face: u32) -> [u32; 6] {
    let base = 4 * face;
    [base, 1 + base, 3 + base, base, 3 + base, 2 + base]
}

/// Accumulates render geometry, one quad at a time.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
    /// Vertex data, four entries per face.
    pub vertices: Vec<Vertex>,
    /// Triangle indices, six entries per face.
    pub indices: Vec<u32>,
    num_faces: u32,
}

impl MeshBuffers {
    /// Creates an empty buffer set.
    pub fn new() -> Self {
        MeshBuffers::default()
    }

    /// Appends one quad. Corners are ordered lower-left, lower-right,
    /// upper-left, upper-right.
    pub fn push_face(&mut self, corners: [Vertex; 4]) {
        self.indices.extend(face_indices(self.num_faces));
        self.vertices.extend(corners);
        self.num_faces += 1;
    }

    /// How many quads have been pushed.
    pub fn face_count(&self) -> u32 {
        self.num_faces
    }

    /// Whether no geometry has been pushed.
    pub fn is_empty(&self) -> bool {
        self.num_faces == 0
    }
}

/// Accumulates collision geometry, one quad at a time.
///
/// Collider faces have no texture data, only corner positions.
#[derive(Clone, Debug, Default)]
pub struct ColliderBuffers {
    /// Corner positions, four entries per face.
    pub vertices: Vec<Point3<i32>>,
    /// Triangle indices, six entries per face.
    pub indices: Vec<u32>,
    num_faces: u32,
}

impl ColliderBuffers {
    /// Creates an empty buffer set.
    pub fn new() -> Self {
        ColliderBuffers::default()
    }

    /// Appends one quad in the same corner order as `MeshBuffers::push_face`.
    pub fn push_face(&mut self, corners: [Point3<i32>; 4]) {
        self.indices.extend(face_indices(self.num_faces));
        self.vertices.extend(corners);
        self.num_faces += 1;
    }

    /// How many quads have been pushed.
    pub fn face_count(&self) -> u32 {
        self.num_faces
    }

    /// Whether no geometry has been pushed.
    pub fn is_empty(&self) -> bool {
        self.num_faces == 0
    }
}

/// A finished chunk mesh: render geometry plus its collision counterpart.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Textured geometry for drawing.
    pub render: MeshBuffers,
    /// Untextured geometry for physics.
    pub collision: ColliderBuffers,
}
