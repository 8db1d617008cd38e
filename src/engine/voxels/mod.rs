//! # Voxels Module
//!
//! Block definitions, chunk storage, and the chunk grid. Everything the
//! generation and meshing systems read or write lives under this module.

pub mod block;
pub mod chunk;
pub mod grid;
