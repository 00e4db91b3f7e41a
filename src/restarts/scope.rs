/*!
 * Restart Scope
 * Establishes a restart frame and receives the transfers aimed at it
 */

use super::frame::Restarts;
use crate::context::{ensure_deliverable, push_restart_frame};
use crate::core::errors::{ConditionResult, ControlError, Unwind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Run `body` with `restarts` available
///
/// If a handler invokes one of these restarts, `body` is abandoned: every
/// scope between the signal site and here exits through `Err` and `Drop`,
/// and the chosen restart's function produces this call's result.
///
/// Transfers aimed at an outer scope pass through unchanged. A transfer aimed
/// at a frame that is no longer live anywhere in this context panics.
///
/// # Example
///
/// ```
/// use conditions::{invoke_restart, with_restarts, Restarts};
///
/// let value = with_restarts(
///     Restarts::new().restart("use_value", |x: i64| x),
///     || invoke_restart("use_value", 42_i64),
/// );
/// assert_eq!(value.unwrap(), 42);
/// ```
pub fn with_restarts<'a, T: 'a>(
    restarts: Restarts<'a, T>,
    body: impl FnOnce() -> ConditionResult<T>,
) -> ConditionResult<T> {
    let (frame, functions) = restarts.into_frame().map_err(|e| {
        warn!(error = %e, "Rejected restart frame");
        Unwind::from(e)
    })?;

    let guard = push_restart_frame(Arc::new(frame));
    let id = guard.frame();
    let outcome = body();
    drop(guard);

    match outcome {
        Err(Unwind::Transfer(transfer)) if transfer.target() == id => {
            let (_, index, restart, argument) = transfer.into_parts();
            debug!(frame = %id, restart = %restart, "Restart taken");
            match functions.into_iter().nth(index) {
                Some(function) => function(argument),
                None => Err(ControlError::NoSuchRestart(restart).into()),
            }
        }
        other => ensure_deliverable(other),
    }
}
