use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation flag shared between a chunk and its in-flight workers.
///
/// Every stage or meshing job carries a clone of its chunk's token. Workers check
/// the token before starting work and report whether it was cancelled when they
/// finish, so a torn-down chunk never has its results applied. Cancellation is a
/// one-way latch; a cancelled token stays cancelled.
///
/// Stages run to completion without internal yield points, so the token is only
/// consulted at the job boundaries rather than inside the voxel loops.
///
/// # Examples
/// ```
/// use voxel_terrain::core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token in the not-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Latches the token into the cancelled state.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once `cancel` has been called on any clone of this token.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn cancellation_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());

        // Latched, not toggled.
        assert!(token.is_cancelled());
    }
}
