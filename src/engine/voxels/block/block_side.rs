//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the neighbor offsets
//! used for face-visibility checks.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned the integer the mesher uses to index the texture
/// tile table, and the order here is the order faces are evaluated in when a
/// block is meshed.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The face toward positive X.
    EAST = 0,

    /// The face toward positive Y.
    TOP = 1,

    /// The face toward positive Z.
    NORTH = 2,

    /// The face toward negative X.
    WEST = 3,

    /// The face toward negative Y.
    BOTTOM = 4,

    /// The face toward negative Z.
    SOUTH = 5,
}

impl BlockSide {
    /// Returns all six block faces in evaluation order.
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::EAST,
            BlockSide::TOP,
            BlockSide::NORTH,
            BlockSide::WEST,
            BlockSide::BOTTOM,
            BlockSide::SOUTH,
        ]
    }

    /// Returns the unit offset from a block to the neighbor this face looks at.
    ///
    /// # Returns
    /// A `Vector3<i32>` with exactly one non-zero component.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::EAST => Vector3::new(1, 0, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::NORTH => Vector3::new(0, 0, 1),
            BlockSide::WEST => Vector3::new(-1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::SOUTH => Vector3::new(0, 0, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BlockSide;

    #[test]
    fn offsets_are_unit_axis_vectors() {
        for side in BlockSide::all() {
            let offset = side.offset();
            let magnitude = offset.x.abs() + offset.y.abs() + offset.z.abs();
            assert_eq!(magnitude, 1, "{side:?} offset must touch one neighbor");
        }
    }

    #[test]
    fn opposite_sides_cancel() {
        let zero = BlockSide::EAST.offset() + BlockSide::WEST.offset();
        assert_eq!((zero.x, zero.y, zero.z), (0, 0, 0));
        let zero = BlockSide::TOP.offset() + BlockSide::BOTTOM.offset();
        assert_eq!((zero.x, zero.y, zero.z), (0, 0, 0));
        let zero = BlockSide::NORTH.offset() + BlockSide::SOUTH.offset();
        assert_eq!((zero.x, zero.y, zero.z), (0, 0, 0));
    }
}
