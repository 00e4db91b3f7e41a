/*!
 * Context Snapshots
 *
 * Copy a thread's dynamic context so another thread can continue inside it.
 * The copy shares the parent's frames but not its stack: later pushes on
 * either side are invisible to the other.
 */

use super::{depths, ensure_deliverable, replace_context, with_context, DynamicContext};
use crate::core::errors::ConditionResult;
use std::marker::PhantomData;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Frozen copy of a dynamic context
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    context: DynamicContext,
}

impl ContextSnapshot {
    /// Capture the calling thread's current stacks
    pub fn capture() -> Self {
        Self {
            context: with_context(|cx| cx.clone()),
        }
    }

    pub fn restart_depth(&self) -> usize {
        self.context.restarts.depth()
    }

    pub fn handler_depth(&self) -> usize {
        self.context.handlers.depth()
    }

    /// Run `body` with this snapshot as the current context
    ///
    /// The calling thread's own context is put back afterwards, also when
    /// `body` panics. A transfer `body` returns must target a frame that is
    /// live in the restored context.
    ///
    /// # Panics
    ///
    /// If `body` returns a transfer to a frame the restored context no longer
    /// holds.
    pub fn enter<T>(&self, body: impl FnOnce() -> ConditionResult<T>) -> ConditionResult<T> {
        let result = self.run(body);
        ensure_deliverable(result)
    }

    fn run<T>(&self, body: impl FnOnce() -> T) -> T {
        let previous = replace_context(self.context.clone());
        let _restore = RestoreContext {
            previous: Some(previous),
            _not_send: PhantomData,
        };
        debug!(
            restarts = self.restart_depth(),
            handlers = self.handler_depth(),
            "entered context snapshot"
        );
        body()
    }
}

struct RestoreContext {
    previous: Option<DynamicContext>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for RestoreContext {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            replace_context(previous);
        }
    }
}

/// Handle to a thread started with [`spawn`]
#[derive(Debug)]
pub struct ContextJoinHandle<T> {
    inner: JoinHandle<ConditionResult<T>>,
}

impl<T> ContextJoinHandle<T> {
    /// Wait for the child and hand back its result
    ///
    /// A transfer aimed at one of the parent's frames comes back as
    /// `Err(Unwind::Transfer)`; propagate it with `?` to land in the parent's
    /// scope. A panic in the child is resumed on the caller.
    ///
    /// # Panics
    ///
    /// If the child returns a transfer to a frame the joining thread no
    /// longer holds, for example because the handle outlived the scope.
    pub fn join(self) -> ConditionResult<T> {
        match self.inner.join() {
            Ok(result) => ensure_deliverable(result),
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Start a thread that inherits a copy of the caller's dynamic context
pub fn spawn<T, F>(body: F) -> ContextJoinHandle<T>
where
    F: FnOnce() -> ConditionResult<T> + Send + 'static,
    T: Send + 'static,
{
    let snapshot = ContextSnapshot::capture();
    debug!(parent = ?depths(), "spawning child context");
    // The child's own context starts empty, so delivery is checked on join
    let inner = thread::spawn(move || snapshot.run(body));
    ContextJoinHandle { inner }
}
