//! # Chunk Grid Module
//!
//! The sparse chunk map and the cross-chunk block lookup the mesher uses for
//! border faces.
//!
//! ## Architecture
//!
//! Chunks are stored behind `MtResource` so meshing workers can resolve
//! neighbor blocks while the driver owns the map. A lookup takes a brief read
//! lock on the target chunk, then reads its volume atomically; the volume may
//! be mid-generation, which is tolerated because the reader re-meshes once the
//! neighbor's stage completes.
//!
//! Coordinates outside every loaded chunk resolve to `NULL`, so geometry at
//! the edge of the loaded world renders as if facing open air.

use std::collections::HashMap;

use cgmath::Point3;

use crate::core::MtResource;

use super::block::block_type::BlockType;
use super::chunk::volume::{CHUNK_DIMENSION, CHUNK_HEIGHT};
use super::chunk::Chunk;

/// Resolves a world-space block coordinate to a block type.
///
/// The mesher is generic over this trait so tests can substitute fixed
/// neighborhoods. Unloaded or out-of-range coordinates must resolve to
/// `NULL`, the transparent sentinel.
pub trait NeighborQuery {
    /// Returns the block at a world-space coordinate.
    fn block_at(&self, position: Point3<i32>) -> BlockType;
}

/// A sparse 2D grid of chunks keyed by chunk coordinates.
///
/// The world is one chunk tall, so keys always carry `y == 0` and the world
/// y coordinate indexes into a chunk's column directly.
pub struct ChunkGrid {
    chunks: HashMap<Point3<i32>, MtResource<Chunk>>,
}

impl ChunkGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        ChunkGrid {
            chunks: HashMap::new(),
        }
    }

    /// Inserts a chunk, keyed by its own position. Does nothing if a chunk is
    /// already loaded there.
    pub fn insert(&mut self, chunk: Chunk) {
        if self.chunks.contains_key(&chunk.position) {
            return;
        }
        self.chunks.insert(chunk.position, MtResource::new(chunk));
    }

    /// Removes and returns the chunk at the given chunk coordinates.
    pub fn remove(&mut self, position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.remove(&position)
    }

    /// Retrieves a handle to the chunk at the given chunk coordinates.
    ///
    /// # Returns
    /// A clone of the `MtResource<Chunk>` if the chunk is loaded, or `None`.
    pub fn chunk_at(&self, position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&position).cloned()
    }

    /// The chunk coordinates of every loaded chunk.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    /// The number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunks are loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Converts a world-space block coordinate to the owning chunk coordinates.
    pub fn chunk_position_of(world: Point3<i32>) -> Point3<i32> {
        Point3::new(
            world.x.div_euclid(CHUNK_DIMENSION),
            0,
            world.z.div_euclid(CHUNK_DIMENSION),
        )
    }
}

impl NeighborQuery for ChunkGrid {
    fn block_at(&self, position: Point3<i32>) -> BlockType {
        if !(0..CHUNK_HEIGHT).contains(&position.y) {
            return BlockType::NULL;
        }
        match self.chunks.get(&Self::chunk_position_of(position)) {
            Some(chunk) => {
                let local_x = position.x.rem_euclid(CHUNK_DIMENSION);
                let local_z = position.z.rem_euclid(CHUNK_DIMENSION);
                chunk.get().volume.get(local_x, position.y, local_z)
            }
            None => BlockType::NULL,
        }
    }
}

/// Worker-side neighbor resolution: lock the grid briefly per query.
impl NeighborQuery for MtResource<ChunkGrid> {
    fn block_at(&self, position: Point3<i32>) -> BlockType {
        self.get().block_at(position)
    }
}

impl Default for ChunkGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_chunk_at(position: Point3<i32>) -> ChunkGrid {
        let mut grid = ChunkGrid::new();
        grid.insert(Chunk::new(position, CHUNK_HEIGHT, None));
        grid
    }

    #[test]
    fn world_coordinates_map_into_neighbor_chunks() {
        let grid = grid_with_chunk_at(Point3::new(-1, 0, 0));
        if let Some(chunk) = grid.chunk_at(Point3::new(-1, 0, 0)) {
            chunk.get().volume.set(15, 10, 0, BlockType::STONE);
        }

        // World x = -1 is local x = 15 of chunk -1.
        assert_eq!(
            grid.block_at(Point3::new(-1, 10, 0)),
            BlockType::STONE
        );
        assert_eq!(grid.block_at(Point3::new(-2, 10, 0)), BlockType::NULL);
    }

    #[test]
    fn unloaded_and_out_of_range_lookups_are_null() {
        let grid = grid_with_chunk_at(Point3::new(0, 0, 0));
        assert_eq!(grid.block_at(Point3::new(400, 10, 0)), BlockType::NULL);
        assert_eq!(grid.block_at(Point3::new(0, -1, 0)), BlockType::NULL);
        assert_eq!(grid.block_at(Point3::new(0, CHUNK_HEIGHT, 0)), BlockType::NULL);
    }

    #[test]
    fn duplicate_inserts_keep_the_first_chunk() {
        let mut grid = grid_with_chunk_at(Point3::new(0, 0, 0));
        if let Some(chunk) = grid.chunk_at(Point3::new(0, 0, 0)) {
            chunk.get().volume.set(0, 0, 0, BlockType::BRICK);
        }

        grid.insert(Chunk::new(Point3::new(0, 0, 0), CHUNK_HEIGHT, None));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.block_at(Point3::new(0, 0, 0)), BlockType::BRICK);
    }
}
