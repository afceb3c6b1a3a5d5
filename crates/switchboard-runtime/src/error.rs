//! Offload error types.

use switchboard_core::DispatchError;
use thiserror::Error;

/// Errors reported through a [`PendingResult`](crate::PendingResult) or when
/// starting an offload worker.
#[derive(Error, Debug)]
pub enum OffloadError {
    /// The worker thread could not be started.
    #[error("failed to start offload worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The offloaded handler returned an error.
    #[error(transparent)]
    Failed(#[from] DispatchError),

    /// The offloaded handler panicked.
    #[error("offloaded handler for `{message}` panicked: {reason}")]
    Panicked {
        /// The message type.
        message: &'static str,
        /// The panic payload, if it was a string.
        reason: String,
    },

    /// The job was dropped before it ran, because the queue was full or the
    /// worker shut down first.
    #[error("offloaded `{message}` was dropped before it ran")]
    Dropped {
        /// The message type.
        message: &'static str,
    },
}

impl OffloadError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            OffloadError::Spawn(_) => "offload_spawn",
            OffloadError::Failed(_) => "offload_failed",
            OffloadError::Panicked { .. } => "offload_panicked",
            OffloadError::Dropped { .. } => "offload_dropped",
        }
    }
}

/// Result type for offloaded jobs.
pub type OffloadResult<T> = Result<T, OffloadError>;
