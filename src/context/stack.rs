/*!
 * Dynamic Stack
 * LIFO sequence of frames owned by one execution context
 */

use crate::core::guard::{GuardError, GuardResult};
use crate::core::types::FrameId;
use std::sync::Arc;

/// Anything that can live on a dynamic stack
pub trait StackFrame {
    fn id(&self) -> FrameId;
}

/// Snapshot iterator from the innermost frame outward
pub type Innermost<F> = std::iter::Rev<std::vec::IntoIter<Arc<F>>>;

/// Ordered stack of shared frames
///
/// Cloning copies the frame list, not the frames: both copies see the same
/// immutable frames but pushes on one are invisible to the other.
#[derive(Debug)]
pub struct DynamicStack<F> {
    frames: Vec<Arc<F>>,
}

impl<F> Default for DynamicStack<F> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<F> Clone for DynamicStack<F> {
    fn clone(&self) -> Self {
        Self {
            frames: self.frames.clone(),
        }
    }
}

impl<F: StackFrame> DynamicStack<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame, returning the new depth
    pub fn push(&mut self, frame: Arc<F>) -> usize {
        self.frames.push(frame);
        self.frames.len()
    }

    /// Pop the frame `expected`
    ///
    /// The frame must be on top. A buried frame is left in place and the
    /// violation reported; the caller decides whether to `remove` it.
    pub fn pop(&mut self, expected: FrameId) -> GuardResult<Arc<F>> {
        match self.frames.last().map(|top| top.id()) {
            Some(top) if top == expected => {
                self.frames.pop().ok_or(GuardError::NotOnStack(expected))
            }
            Some(found) if self.contains(expected) => {
                Err(GuardError::OutOfOrder { expected, found })
            }
            _ => Err(GuardError::NotOnStack(expected)),
        }
    }

    /// Remove the frame `id` wherever it sits
    pub fn remove(&mut self, id: FrameId) -> Option<Arc<F>> {
        self.position(id).map(|index| self.frames.remove(index))
    }

    /// Iterate a snapshot from the innermost (most recently pushed) frame
    ///
    /// Each call takes a fresh snapshot; mutating the stack afterwards does
    /// not affect an iterator already handed out.
    pub fn iter_from_innermost(&self) -> Innermost<F> {
        self.frames.clone().into_iter().rev()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().rposition(|frame| frame.id() == id)
    }

    /// Cut the stack back to `depth` frames, returning the removed tail
    pub(crate) fn split_off(&mut self, depth: usize) -> Vec<Arc<F>> {
        if depth >= self.frames.len() {
            return Vec::new();
        }
        self.frames.split_off(depth)
    }

    /// Put back a tail removed by `split_off`
    pub(crate) fn restore(&mut self, tail: Vec<Arc<F>>) {
        self.frames.extend(tail);
    }
}
