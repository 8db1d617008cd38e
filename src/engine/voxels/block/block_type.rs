//! # Block Type Module
//!
//! This module defines the closed set of block types the terrain pipeline can
//! produce, along with the derived predicates the generator and mesher key off
//! of. Conversion from raw bytes and from configuration-file names lives here
//! as well.

use num_derive::FromPrimitive;
use phf::phf_map;
use serde::de::{self, Deserialize, Deserializer};

use super::BlockTypeSize;

/// Enumerates all block types the generation stages can write into a volume.
///
/// Variants are ordered so the discriminant doubles as the storage byte and as
/// the row index into the texture tile table. The `FromPrimitive` derive allows
/// conversion back from the stored byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// No block at all. Fully transparent and never rendered or collided with.
    NULL,

    /// The unbreakable world base layer.
    BEDROCK,

    /// The bulk terrain material produced by the height-map stage.
    STONE,

    /// Fills every cell below the world floor height.
    SAND,

    /// Strata filler deposited beneath surface grass.
    DIRT,

    /// The strata surface block. Top, sides, and bottom use distinct tiles.
    GRASS,

    /// A worked stone variant, available to configuration but not placed by
    /// the default stages.
    COBBLESTONE,

    /// The default density-stage debug material.
    BRICK,

    /// Tree trunk material with distinct side and end-cap tiles.
    LOG,

    /// Foliage. Solid for collision but transparent to face culling, so
    /// neighboring leaf faces still render.
    LEAVES,

    /// Coal ore.
    COAL,

    /// Iron ore.
    IRON,

    /// Gold ore.
    GOLD,

    /// Diamond ore.
    DIAMOND,

    /// Redstone ore.
    REDSTONE,

    /// A decorative grass tuft rendered as a cross-plane.
    TALLGRASS,

    /// A decorative rose rendered as a cross-plane.
    ROSE,

    /// A decorative dandelion rendered as a cross-plane.
    DANDELION,

    /// A planted sapling rendered as a cross-plane.
    SAPLING,
}

/// Maps configuration-file block names to block types.
///
/// Keys are lowercase; `BlockType::from_name` lowercases its input before the
/// lookup so JSON authors can use either case.
static BLOCK_NAMES: phf::Map<&'static str, BlockType> = phf_map! {
    "null" => BlockType::NULL,
    "bedrock" => BlockType::BEDROCK,
    "stone" => BlockType::STONE,
    "sand" => BlockType::SAND,
    "dirt" => BlockType::DIRT,
    "grass" => BlockType::GRASS,
    "cobblestone" => BlockType::COBBLESTONE,
    "brick" => BlockType::BRICK,
    "log" => BlockType::LOG,
    "leaves" => BlockType::LEAVES,
    "coal" => BlockType::COAL,
    "iron" => BlockType::IRON,
    "gold" => BlockType::GOLD,
    "diamond" => BlockType::DIAMOND,
    "redstone" => BlockType::REDSTONE,
    "tallgrass" => BlockType::TALLGRASS,
    "rose" => BlockType::ROSE,
    "dandelion" => BlockType::DANDELION,
    "sapling" => BlockType::SAPLING,
};

impl BlockType {
    /// Decodes a stored byte into a `BlockType`.
    ///
    /// Volume cells are read without synchronization by neighboring chunks, so
    /// this conversion must be total: any byte outside the enumeration decodes
    /// to `NULL` rather than panicking.
    ///
    /// # Arguments
    /// * `raw` - The block type as stored in a volume cell
    ///
    /// # Returns
    /// The corresponding `BlockType`, or `NULL` for unknown bytes.
    pub fn from_raw(raw: BlockTypeSize) -> Self {
        let btype_option: Option<BlockType> = num::FromPrimitive::from_u8(raw);
        btype_option.unwrap_or(BlockType::NULL)
    }

    /// Looks up a block type by its configuration-file name.
    ///
    /// # Arguments
    /// * `name` - A block name such as `"stone"` or `"Grass"`
    ///
    /// # Returns
    /// `Some(BlockType)` for a known name, `None` otherwise.
    pub fn from_name(name: &str) -> Option<Self> {
        BLOCK_NAMES.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Whether this block occludes neighboring faces and contributes to the
    /// collision mesh.
    pub fn is_solid(self) -> bool {
        !matches!(self, BlockType::NULL) && !self.is_not_block()
    }

    /// Whether face culling sees through this block.
    ///
    /// `NULL`, leaves, and all decorative cross-plane blocks are transparent;
    /// a face adjacent to any of them is rendered.
    pub fn is_transparent(self) -> bool {
        matches!(self, BlockType::NULL | BlockType::LEAVES) || self.is_not_block()
    }

    /// Whether this block renders as a decorative cross-plane instead of a cube.
    pub fn is_not_block(self) -> bool {
        matches!(
            self,
            BlockType::TALLGRASS | BlockType::ROSE | BlockType::DANDELION | BlockType::SAPLING
        )
    }

    /// Whether the vegetation stage may plant on top of this block.
    pub fn is_fertile(self) -> bool {
        matches!(self, BlockType::GRASS | BlockType::DIRT)
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        BlockType::from_name(&name)
            .ok_or_else(|| de::Error::custom(format_args!("unknown block name {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_round_trip_through_storage() {
        for block in [BlockType::NULL, BlockType::STONE, BlockType::SAPLING] {
            assert_eq!(BlockType::from_raw(block as BlockTypeSize), block);
        }
    }

    #[test]
    fn unknown_bytes_decode_to_null() {
        assert_eq!(BlockType::from_raw(0xFF), BlockType::NULL);
        assert_eq!(BlockType::from_raw(BlockType::SAPLING as u8 + 1), BlockType::NULL);
    }

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(BlockType::from_name("stone"), Some(BlockType::STONE));
        assert_eq!(BlockType::from_name("Grass"), Some(BlockType::GRASS));
        assert_eq!(BlockType::from_name("granite"), None);
    }

    #[test]
    fn predicates_partition_the_block_set() {
        assert!(BlockType::STONE.is_solid());
        assert!(!BlockType::STONE.is_transparent());

        assert!(!BlockType::NULL.is_solid());
        assert!(BlockType::NULL.is_transparent());

        // Leaves collide but do not occlude.
        assert!(BlockType::LEAVES.is_solid());
        assert!(BlockType::LEAVES.is_transparent());

        // Decoratives neither collide nor occlude.
        assert!(BlockType::TALLGRASS.is_not_block());
        assert!(!BlockType::TALLGRASS.is_solid());
        assert!(BlockType::TALLGRASS.is_transparent());

        assert!(BlockType::GRASS.is_fertile());
        assert!(BlockType::DIRT.is_fertile());
        assert!(!BlockType::SAND.is_fertile());
    }
}
