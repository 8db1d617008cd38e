//! # Block Module
//!
//! Block type definitions, face handling, and the data-driven mapping from
//! block type and face to texture atlas tile.

use block_side::BlockSide;
use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// Volume cells store this type and decode it back through `BlockType::from_raw`.
pub type BlockTypeSize = u8;

/// Index of a single cell in the texture atlas.
pub type TileId = u32;

/// Named tiles of the texture atlas, laid out row by row.
///
/// The atlas itself belongs to the rendering backend; the pipeline only emits
/// these indices into vertex data.
pub mod tiles {
    use super::TileId;

    /// Placeholder tile for bytes that decode to no real block.
    pub const MISSING: TileId = 0;
    /// Grass block, top face.
    pub const GRASS_TOP: TileId = 1;
    /// Grass block, side faces.
    pub const GRASS_SIDE: TileId = 2;
    /// Plain dirt.
    pub const DIRT: TileId = 3;
    /// Plain stone.
    pub const STONE: TileId = 4;
    /// Sand.
    pub const SAND: TileId = 5;
    /// Bedrock.
    pub const BEDROCK: TileId = 6;
    /// Cobblestone.
    pub const COBBLESTONE: TileId = 7;

    /// Brick.
    pub const BRICK: TileId = 8;
    /// Log bark, side faces.
    pub const LOG_SIDE: TileId = 9;
    /// Log rings, top and bottom faces.
    pub const LOG_TOP: TileId = 10;
    /// Leaves.
    pub const LEAVES: TileId = 11;
    /// Flattened stone used to cap blocks sliced by the section plane.
    pub const STONE_FLATTEN: TileId = 12;

    /// Coal ore.
    pub const COAL: TileId = 13;
    /// Iron ore.
    pub const IRON: TileId = 14;
    /// Gold ore.
    pub const GOLD: TileId = 15;
    /// Diamond ore.
    pub const DIAMOND: TileId = 16;
    /// Redstone ore.
    pub const REDSTONE: TileId = 17;

    /// Tall grass cross-plane.
    pub const TALLGRASS: TileId = 18;
    /// Rose cross-plane.
    pub const ROSE: TileId = 19;
    /// Dandelion cross-plane.
    pub const DANDELION: TileId = 20;
    /// Sapling cross-plane.
    pub const SAPLING: TileId = 21;
}

/// Maps each block type to its texture tile for each face.
///
/// The outer array is indexed by `BlockType` as a `usize`, the inner array by
/// `BlockSide` as a `usize`. Blocks with direction-dependent appearance, such
/// as grass and logs, are expressed as data here instead of being special-cased
/// in the mesher.
pub static BLOCK_TYPE_TO_TILES: [[TileId; 6]; 19] = [
    // [EAST, TOP, NORTH, WEST, BOTTOM, SOUTH]
    [tiles::MISSING; 6],     // NULL (never meshed)
    [tiles::BEDROCK; 6],     // BEDROCK
    [tiles::STONE; 6],       // STONE
    [tiles::SAND; 6],        // SAND
    [tiles::DIRT; 6],        // DIRT
    [
        tiles::GRASS_SIDE,
        tiles::GRASS_TOP,
        tiles::GRASS_SIDE,
        tiles::GRASS_SIDE,
        tiles::DIRT,
        tiles::GRASS_SIDE,
    ], // GRASS
    [tiles::COBBLESTONE; 6], // COBBLESTONE
    [tiles::BRICK; 6],       // BRICK
    [
        tiles::LOG_SIDE,
        tiles::LOG_TOP,
        tiles::LOG_SIDE,
        tiles::LOG_SIDE,
        tiles::LOG_TOP,
        tiles::LOG_SIDE,
    ], // LOG
    [tiles::LEAVES; 6],      // LEAVES
    [tiles::COAL; 6],        // COAL
    [tiles::IRON; 6],        // IRON
    [tiles::GOLD; 6],        // GOLD
    [tiles::DIAMOND; 6],     // DIAMOND
    [tiles::REDSTONE; 6],    // REDSTONE
    [tiles::TALLGRASS; 6],   // TALLGRASS
    [tiles::ROSE; 6],        // ROSE
    [tiles::DANDELION; 6],   // DANDELION
    [tiles::SAPLING; 6],     // SAPLING
];

/// Looks up the texture tile for one face of a block.
///
/// # Arguments
/// * `block_type` - The block being meshed
/// * `side` - Which face of the block
///
/// # Returns
/// The atlas tile to texture that face with.
pub fn face_tile(block_type: BlockType, side: BlockSide) -> TileId {
    BLOCK_TYPE_TO_TILES[block_type as usize][side as usize]
}

/// Looks up the texture tile for a decorative cross-plane block.
///
/// Cross-plane geometry has no distinct faces, so the tile is the same from
/// every direction.
pub fn cross_tile(block_type: BlockType) -> TileId {
    BLOCK_TYPE_TO_TILES[block_type as usize][0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_tiles_differ_by_face() {
        assert_eq!(face_tile(BlockType::GRASS, BlockSide::TOP), tiles::GRASS_TOP);
        assert_eq!(face_tile(BlockType::GRASS, BlockSide::BOTTOM), tiles::DIRT);
        assert_eq!(face_tile(BlockType::GRASS, BlockSide::EAST), tiles::GRASS_SIDE);
        assert_eq!(face_tile(BlockType::GRASS, BlockSide::SOUTH), tiles::GRASS_SIDE);
    }

    #[test]
    fn log_tiles_cap_both_ends() {
        assert_eq!(face_tile(BlockType::LOG, BlockSide::TOP), tiles::LOG_TOP);
        assert_eq!(face_tile(BlockType::LOG, BlockSide::BOTTOM), tiles::LOG_TOP);
        assert_eq!(face_tile(BlockType::LOG, BlockSide::WEST), tiles::LOG_SIDE);
    }

    #[test]
    fn uniform_blocks_use_one_tile_everywhere() {
        for side in BlockSide::all() {
            assert_eq!(face_tile(BlockType::STONE, side), tiles::STONE);
            assert_eq!(face_tile(BlockType::DIAMOND, side), tiles::DIAMOND);
        }
    }

    #[test]
    fn every_block_type_has_a_tile_row() {
        // SAPLING is the last variant; the table must cover the whole enum.
        assert_eq!(BLOCK_TYPE_TO_TILES.len(), BlockType::SAPLING as usize + 1);
        assert_eq!(cross_tile(BlockType::TALLGRASS), tiles::TALLGRASS);
    }
}
