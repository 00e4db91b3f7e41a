/*!
 * RAII Frame Guards
 *
 * Every frame pushed onto a dynamic stack is owned by a guard that pops it
 * when the scope exits: normal return, `Err` propagation, or panic unwinding.
 *
 * ## Design Principles
 *
 * 1. **Structural LIFO**: pop order follows drop order, not caller discipline
 * 2. **Observable**: push and pop emit trace events with frame lifetime
 * 3. **Never panic on drop**: imbalance is logged, not escalated
 */

mod traits;

pub use traits::{Guard, GuardDrop};

use crate::core::types::FrameId;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Frame already released")]
    AlreadyReleased,

    #[error("Out-of-order release: expected {expected} on top, found {found}")]
    OutOfOrder { expected: FrameId, found: FrameId },

    #[error("Frame {0} is not on the stack")]
    NotOnStack(FrameId),
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
    pub frame: FrameId,
    /// Stack depth right after the push
    pub depth: usize,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str, frame: FrameId) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
            frame,
            depth: 0,
        }
    }

    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
