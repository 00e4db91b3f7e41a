/*!
 * Dynamic Context
 *
 * Per-thread restart and handler stacks. Created lazily on first use and
 * alive for the thread's lifetime; there is no teardown API.
 *
 * The `RefCell` borrow is never held while user code runs: every accessor
 * copies out what it needs before returning.
 */

mod snapshot;
mod stack;

pub use snapshot::{spawn, ContextJoinHandle, ContextSnapshot};
pub use stack::{DynamicStack, Innermost, StackFrame};

use crate::core::errors::{ConditionResult, Unwind};
use crate::core::guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult};
use crate::core::types::FrameId;
use crate::restarts::RestartFrame;
use crate::signals::HandlerFrame;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

thread_local! {
    static CONTEXT: RefCell<DynamicContext> = RefCell::new(DynamicContext::default());
}

/// Both stacks of one execution context
#[derive(Debug, Clone, Default)]
pub(crate) struct DynamicContext {
    pub(crate) restarts: DynamicStack<RestartFrame>,
    pub(crate) handlers: DynamicStack<HandlerFrame>,
}

/// Run `f` against this thread's context
///
/// `f` must not call back into user code.
pub(crate) fn with_context<R>(f: impl FnOnce(&mut DynamicContext) -> R) -> R {
    CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
}

/// Swap this thread's context for `context`, returning the previous one
pub(crate) fn replace_context(context: DynamicContext) -> DynamicContext {
    CONTEXT.with(|cell| cell.replace(context))
}

/// Which dynamic stack a guard belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackKind {
    Restart,
    Handler,
}

impl StackKind {
    fn resource_type(self) -> &'static str {
        match self {
            StackKind::Restart => "restart_frame",
            StackKind::Handler => "handler_frame",
        }
    }
}

/// Owns one pushed frame and pops it on drop
///
/// Not `Send`: the frame lives in the creating thread's context.
pub(crate) struct FrameGuard {
    kind: StackKind,
    metadata: GuardMetadata,
    active: bool,
    _not_send: PhantomData<*const ()>,
}

impl FrameGuard {
    pub(crate) fn frame(&self) -> FrameId {
        self.metadata.frame
    }
}

impl Guard for FrameGuard {
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.active = false;

        let frame = self.metadata.frame;
        let mut restart = None;
        let mut handler = None;
        let popped = with_context(|cx| match self.kind {
            StackKind::Restart => {
                let (removed, result) = pop_frame(&mut cx.restarts, frame);
                restart = removed;
                result
            }
            StackKind::Handler => {
                let (removed, result) = pop_frame(&mut cx.handlers, frame);
                handler = removed;
                result
            }
        });
        // Frames own user closures; drop them outside the borrow
        drop(restart);
        drop(handler);

        debug!(
            frame = %frame,
            kind = self.metadata.resource_type,
            lifetime_us = self.metadata.lifetime_micros(),
            "popped frame"
        );
        popped
    }
}

impl GuardDrop for FrameGuard {
    fn on_drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.release() {
            error!(
                frame = %self.metadata.frame,
                kind = self.metadata.resource_type,
                error = %e,
                "dynamic stack imbalance"
            );
        }
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.on_drop();
    }
}

/// Pop `frame`, or pull it out from under newer frames
///
/// The removed frame is handed back so the caller can drop it once the
/// context borrow has ended.
fn pop_frame<F: StackFrame>(
    stack: &mut DynamicStack<F>,
    frame: FrameId,
) -> (Option<Arc<F>>, GuardResult<()>) {
    match stack.pop(frame) {
        Ok(removed) => (Some(removed), Ok(())),
        Err(e @ GuardError::OutOfOrder { .. }) => (stack.remove(frame), Err(e)),
        Err(e) => (None, Err(e)),
    }
}

/// Push a restart frame for the lifetime of the returned guard
pub(crate) fn push_restart_frame(frame: Arc<RestartFrame>) -> FrameGuard {
    let id = frame.id();
    let depth = with_context(|cx| cx.restarts.push(frame));
    guard_for(StackKind::Restart, id, depth)
}

/// Push a handler frame for the lifetime of the returned guard
pub(crate) fn push_handler_frame(frame: Arc<HandlerFrame>) -> FrameGuard {
    let id = frame.id();
    let depth = with_context(|cx| cx.handlers.push(frame));
    guard_for(StackKind::Handler, id, depth)
}

fn guard_for(kind: StackKind, frame: FrameId, depth: usize) -> FrameGuard {
    debug!(frame = %frame, kind = kind.resource_type(), depth, "pushed frame");
    FrameGuard {
        kind,
        metadata: GuardMetadata::new(kind.resource_type(), frame).with_depth(depth),
        active: true,
        _not_send: PhantomData,
    }
}

/// Restart frames, innermost first
pub(crate) fn restart_frames() -> Innermost<RestartFrame> {
    with_context(|cx| cx.restarts.iter_from_innermost())
}

/// Handler frames, innermost first
pub(crate) fn handler_frames() -> Innermost<HandlerFrame> {
    with_context(|cx| cx.handlers.iter_from_innermost())
}

/// Check that a restart frame is still in this context's dynamic extent
pub(crate) fn is_live_restart(frame: FrameId) -> bool {
    with_context(|cx| cx.restarts.contains(frame))
}

/// Pass `result` through unless it is a transfer with nowhere to land
///
/// # Panics
///
/// If `result` carries a transfer whose target frame is not live in this
/// context.
pub(crate) fn ensure_deliverable<T>(result: ConditionResult<T>) -> ConditionResult<T> {
    if let Err(Unwind::Transfer(transfer)) = &result {
        if !is_live_restart(transfer.target()) {
            panic!(
                "{} escaped its dynamic extent: target frame is not live in this context",
                transfer
            );
        }
    }
    result
}

/// Hides handler frames at and above a depth while a handler runs
///
/// A handler executes in the dynamic context of its own binding, so a
/// condition it signals is only seen by handlers outside its frame.
pub(crate) struct HandlerShadow {
    hidden: Vec<Arc<HandlerFrame>>,
    _not_send: PhantomData<*const ()>,
}

pub(crate) fn shadow_handlers(depth: usize) -> HandlerShadow {
    let hidden = with_context(|cx| cx.handlers.split_off(depth));
    HandlerShadow {
        hidden,
        _not_send: PhantomData,
    }
}

impl Drop for HandlerShadow {
    fn drop(&mut self) {
        let hidden = std::mem::take(&mut self.hidden);
        with_context(|cx| cx.handlers.restore(hidden));
    }
}

/// Depth of both stacks at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackDepths {
    pub restarts: usize,
    pub handlers: usize,
}

/// Current depth of this thread's stacks
pub fn depths() -> StackDepths {
    with_context(|cx| StackDepths {
        restarts: cx.restarts.depth(),
        handlers: cx.handlers.depth(),
    })
}

/// Asserts on drop that both stacks are back at their starting depth
///
/// Intended for tests: create one at the top of a test case and let it drop
/// at the end. Skips the check while the thread is already panicking.
#[must_use = "the check runs when the value is dropped"]
pub struct DepthCheck {
    start: StackDepths,
}

impl DepthCheck {
    pub fn new() -> Self {
        Self { start: depths() }
    }

    /// Depths recorded at creation
    pub fn start(&self) -> StackDepths {
        self.start
    }

    /// Check balance now without waiting for drop
    pub fn is_balanced(&self) -> bool {
        depths() == self.start
    }
}

impl Default for DepthCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DepthCheck {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let now = depths();
        assert_eq!(now, self.start, "dynamic stacks are unbalanced");
    }
}
