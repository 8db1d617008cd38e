//! # Block Volume Module
//!
//! The dense block storage for one chunk, plus the snapshot type the mesher
//! reads from.
//!
//! ## Memory and Concurrency
//!
//! A volume is a flat array of atomic bytes, one per cell. Atomic cells let a
//! chunk's own stage worker write the volume while meshing jobs for
//! neighboring chunks read across the border without locks. Those cross-chunk
//! reads use relaxed ordering and may observe stale data mid-stage; that is
//! tolerated because the neighbor re-meshes once the stage completes, and any
//! byte that does not decode to a known block type reads as `NULL`.
//!
//! The mesher never walks the atomics directly. It takes a `VolumeSnapshot`
//! first, which pairs a decoded copy of the blocks with a transparency bit
//! vector so the interior-face culling loop costs one bit test per neighbor.

use bitvec::prelude::BitVec;
use std::sync::atomic::{AtomicU8, Ordering};

use super::super::block::block_type::BlockType;
use super::super::block::BlockTypeSize;

/// The width and depth of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The height of a chunk in blocks.
pub const CHUNK_HEIGHT: i32 = 256;
/// The number of blocks in a single horizontal plane of a chunk.
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk.
pub const CHUNK_VOLUME_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_HEIGHT;

/// Dense block storage for one chunk.
///
/// Cells are addressed by local coordinates with `x` and `z` in
/// `0..CHUNK_DIMENSION` and `y` in `0..CHUNK_HEIGHT`. Every cell always holds
/// a valid byte; a freshly created volume is all `NULL`.
///
/// Writes go through `&self` because the cells are atomic. Exclusive access
/// during generation is enforced one level up by the chunk state machine,
/// which never lets two stages of the same chunk run at once.
pub struct BlockVolume {
    cells: Box<[AtomicU8]>,
}

impl BlockVolume {
    /// Creates a volume with every cell set to `NULL`.
    pub fn new() -> Self {
        let cells = (0..CHUNK_VOLUME_SIZE)
            .map(|_| AtomicU8::new(BlockType::NULL as BlockTypeSize))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        BlockVolume { cells }
    }

    /// Whether a local coordinate lies inside the volume.
    pub fn contains(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_DIMENSION).contains(&x)
            && (0..CHUNK_HEIGHT).contains(&y)
            && (0..CHUNK_DIMENSION).contains(&z)
    }

    fn index(x: i32, y: i32, z: i32) -> usize {
        debug_assert!(
            Self::contains(x, y, z),
            "block coordinate out of bounds: ({x}, {y}, {z})"
        );
        (x + CHUNK_DIMENSION * z + CHUNK_PLANE_SIZE * y) as usize
    }

    /// Reads the block at a local coordinate.
    ///
    /// Safe to call from any thread, including while another thread is
    /// writing; the read is relaxed and unknown bytes decode to `NULL`.
    ///
    /// # Panics
    /// Panics in debug builds if the coordinate is out of bounds.
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        let raw = self.cells[Self::index(x, y, z)].load(Ordering::Relaxed);
        BlockType::from_raw(raw)
    }

    /// Writes the block at a local coordinate.
    ///
    /// # Panics
    /// Panics in debug builds if the coordinate is out of bounds.
    pub fn set(&self, x: i32, y: i32, z: i32, block: BlockType) {
        self.cells[Self::index(x, y, z)].store(block as BlockTypeSize, Ordering::Relaxed);
    }

    /// Decodes the whole volume into a `VolumeSnapshot`.
    ///
    /// The snapshot is a moment-in-time copy; later writes to the volume are
    /// not reflected in it.
    pub fn snapshot(&self) -> VolumeSnapshot {
        let mut blocks = Vec::with_capacity(self.cells.len());
        let mut transparency = BitVec::with_capacity(self.cells.len());
        for cell in self.cells.iter() {
            let block = BlockType::from_raw(cell.load(Ordering::Relaxed));
            blocks.push(block);
            transparency.push(block.is_transparent());
        }
        VolumeSnapshot {
            blocks,
            transparency,
        }
    }
}

impl Default for BlockVolume {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded, immutable copy of a volume taken at meshing time.
///
/// Alongside the block array it carries a bit vector with one transparency bit
/// per cell, so the face-culling inner loop is a single bit test for interior
/// neighbors.
pub struct VolumeSnapshot {
    blocks: Vec<BlockType>,
    transparency: BitVec,
}

impl VolumeSnapshot {
    /// Reads the block at a local coordinate.
    ///
    /// # Panics
    /// Panics in debug builds if the coordinate is out of bounds.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockType {
        self.blocks[BlockVolume::index(x, y, z)]
    }

    /// Whether the cell at a local coordinate is transparent to face culling.
    ///
    /// # Panics
    /// Panics in debug builds if the coordinate is out of bounds.
    pub fn is_transparent(&self, x: i32, y: i32, z: i32) -> bool {
        self.transparency[BlockVolume::index(x, y, z)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_default_to_null() {
        let volume = BlockVolume::new();
        assert_eq!(volume.get(0, 0, 0), BlockType::NULL);
        assert_eq!(
            volume.get(CHUNK_DIMENSION - 1, CHUNK_HEIGHT - 1, CHUNK_DIMENSION - 1),
            BlockType::NULL
        );
    }

    #[test]
    fn set_then_get_round_trips() {
        let volume = BlockVolume::new();
        volume.set(3, 200, 7, BlockType::GOLD);
        assert_eq!(volume.get(3, 200, 7), BlockType::GOLD);
        // Neighboring cells are untouched.
        assert_eq!(volume.get(2, 200, 7), BlockType::NULL);
        assert_eq!(volume.get(3, 199, 7), BlockType::NULL);
    }

    #[test]
    fn snapshot_is_a_stable_copy() {
        let volume = BlockVolume::new();
        volume.set(1, 1, 1, BlockType::STONE);
        let snapshot = volume.snapshot();

        volume.set(1, 1, 1, BlockType::NULL);
        assert_eq!(snapshot.block_at(1, 1, 1), BlockType::STONE);
        assert!(!snapshot.is_transparent(1, 1, 1));
        assert!(snapshot.is_transparent(0, 0, 0));
    }

    #[test]
    fn snapshot_transparency_tracks_block_kind() {
        let volume = BlockVolume::new();
        volume.set(0, 0, 0, BlockType::LEAVES);
        volume.set(1, 0, 0, BlockType::TALLGRASS);
        volume.set(2, 0, 0, BlockType::DIRT);
        let snapshot = volume.snapshot();

        assert!(snapshot.is_transparent(0, 0, 0));
        assert!(snapshot.is_transparent(1, 0, 0));
        assert!(!snapshot.is_transparent(2, 0, 0));
    }
}
