//! Error taxonomy
//!
//! Configuration and acquisition failures are reported as [`AshesError`]
//! and propagate to the application; recording-state failures use the
//! smaller [`crate::core::RecordError`] so callers can treat them as
//! recoverable, `VkResult`-style conditions. Replay itself does not report
//! per-command failures (see the queue documentation).

use thiserror::Error;

/// Errors surfaced by device and backend operations
#[derive(Error, Debug)]
pub enum AshesError {
    /// A create-info failed construction-time validation
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the invalid configuration
        reason: String,
    },

    /// A handle referenced a resource that no longer exists
    #[error("resource lost: {what}")]
    ResourceLost {
        /// Which resource kind the stale handle named
        what: &'static str,
    },

    /// A command buffer was submitted or recorded in the wrong state
    #[error("invalid command buffer state: expected {expected}, found {actual}")]
    InvalidCommandBufferState {
        /// The state the operation requires
        expected: &'static str,
        /// The state the buffer was actually in
        actual: &'static str,
    },

    /// Backend or device initialization failed
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// An error reported by the native API
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for device and backend operations
pub type AshesResult<T> = Result<T, AshesError>;

/// Outcome of waiting on a fence with a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// The fence was signaled within the timeout
    Success,
    /// The timeout elapsed before the fence was signaled
    TimedOut,
    /// The wait itself failed (device loss, or a fence that can never signal)
    Error,
}
