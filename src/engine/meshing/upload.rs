//! The hand-off point between finished meshes and whatever consumes them.

use cgmath::Point3;
use log::debug;

use super::buffers::{ColliderBuffers, MeshBuffers};

/// Receives finalized chunk geometry.
///
/// The engine calls this on its own thread during finalization, once per
/// rebuilt chunk mesh. A rendering backend would copy the buffers into GPU
/// memory here; a physics backend would register the collider.
pub trait MeshUpload: Send {
    /// Accepts the finished buffers for the chunk at `origin`.
    fn upload(&mut self, origin: Point3<i32>, render: &MeshBuffers, collision: &ColliderBuffers);
}

/// An upload sink that only reports what it was given.
///
/// Stands in for a real backend in the headless binary and in tests.
pub struct LoggingUpload;

impl MeshUpload for LoggingUpload {
    fn upload(&mut self, origin: Point3<i32>, render: &MeshBuffers, collision: &ColliderBuffers) {
        debug!(
            "Mesh ready for chunk at {:?}: {} render faces ({} vertices), {} collision faces",
            origin,
            render.face_count(),
            render.vertices.len(),
            collision.face_count()
        );
    }
}
