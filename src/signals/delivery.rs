/*!
 * Signal Delivery
 *
 * Walks the handler stack from the innermost frame outward, calling every
 * matching handler as a plain function. Nothing is unwound unless a handler
 * returns an error.
 */

use super::condition::Condition;
use crate::context::{handler_frames, shadow_handlers};
use crate::core::errors::ConditionResult;
use crate::monitoring::signal_span;
use tracing::trace;

/// Signal `condition` to the active handlers
///
/// Returns `Ok(())` when no handler matches or every matching handler
/// declines. The first handler error, typically a restart transfer, is
/// returned as is.
pub fn signal<C: Condition>(condition: C) -> ConditionResult<()> {
    signal_dyn(&condition)
}

/// Type-erased form of [`signal`]
pub fn signal_dyn(condition: &dyn Condition) -> ConditionResult<()> {
    let ty = condition.condition_type();
    let span = signal_span(&ty);
    let _entered = span.enter();
    let frames = handler_frames();
    let total = frames.len();
    trace!(condition = %ty, frames = total, "Signaling condition");

    for (offset, frame) in frames.enumerate() {
        let depth = total - 1 - offset;
        for binding in frame.matching(&ty) {
            // The handler only sees frames outside its own
            let _shadow = shadow_handlers(depth);
            trace!(condition = %ty, depth, types = %binding.spec(), "Calling handler");
            binding.call(condition)?;
        }
    }

    trace!(condition = %ty, "Condition declined by all handlers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{depths, DepthCheck};
    use crate::core::errors::ControlError;
    use crate::signals::{with_handlers, Handlers};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Ping(u32);
    impl Condition for Ping {}

    #[derive(Debug)]
    struct Pong;
    impl Condition for Pong {}

    #[test]
    fn test_no_handler_is_noop() {
        let _check = DepthCheck::new();
        let before = depths();
        assert!(signal(Ping(1)).is_ok());
        assert_eq!(depths(), before);
    }

    #[test]
    fn test_handlers_called_innermost_first() {
        let _check = DepthCheck::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = log.clone();
        let inner = log.clone();

        with_handlers(
            Handlers::new().on::<Ping, _>(move |p| {
                outer.lock().push(format!("outer {}", p.0));
                Ok(())
            }),
            || {
                with_handlers(
                    Handlers::new().on::<Ping, _>(move |p| {
                        inner.lock().push(format!("inner {}", p.0));
                        Ok(())
                    }),
                    || signal(Ping(7)),
                )
            },
        )
        .unwrap();

        assert_eq!(*log.lock(), vec!["inner 7", "outer 7"]);
    }

    #[test]
    fn test_error_stops_the_walk() {
        let _check = DepthCheck::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let result = with_handlers(
            Handlers::new().on::<Ping, _>(move |_| {
                *counter.lock() += 1;
                Ok(())
            }),
            || {
                with_handlers(
                    Handlers::new().on::<Ping, _>(|_| {
                        Err(ControlError::NoSuchRestart("stop".into()).into())
                    }),
                    || signal(Ping(0)),
                )
            },
        );

        assert!(result.is_err());
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_handler_runs_with_outer_handlers_only() {
        let _check = DepthCheck::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let outer = seen.clone();

        with_handlers(
            Handlers::new().on::<Pong, _>(move |_| {
                outer.lock().push(depths().handlers);
                Ok(())
            }),
            || {
                with_handlers(
                    Handlers::new()
                        .on::<Ping, _>(|_| signal(Pong))
                        .on::<Pong, _>(|_| panic!("handler saw its own frame")),
                    || signal(Ping(3)),
                )
            },
        )
        .unwrap();

        // The outer handler ran with every frame above it hidden
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0], depths().handlers);
    }
}
