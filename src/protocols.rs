/*!
 * Standard Protocols
 *
 * `error`, `cerror` and `warn` built from `signal` and `with_restarts`, plus
 * the canned handlers and invocations for the conventional restarts.
 */

use crate::core::config::{config, WarningOutput};
use crate::core::errors::{ConditionResult, ControlError, Unwind};
use crate::restarts::{invoke_restart, with_restarts, Restarts};
use crate::signals::{signal_dyn, with_handlers, Condition, Handlers};
use std::any::Any;
use std::fmt;

/// Restart established by [`cerror`]
pub const PROCEED: &str = "proceed";

/// Restart established by [`warn`]
pub const MUFFLE: &str = "muffle";

/// Conventional restart name for substituting a value
pub const USE_VALUE: &str = "use_value";

/// Signal `condition`; if no handler transfers control, fail
///
/// Never returns `Ok`. An unhandled condition becomes
/// `ControlError::Unhandled`, except a `ControlError` itself, which is
/// returned as is.
pub fn error<R, C: Condition>(condition: C) -> ConditionResult<R> {
    signal_dyn(&condition)?;

    let unhandled = match (&condition as &dyn Any).downcast_ref::<ControlError>() {
        Some(control) => control.clone(),
        None => ControlError::Unhandled {
            condition_type: condition.type_tag().to_string(),
            message: condition.message(),
        },
    };
    tracing::debug!(error = %unhandled, "Unhandled error condition");
    Err(Unwind::Control(unhandled))
}

/// Continuable error: like [`error`], with a `proceed` restart in scope
///
/// Returns `Ok(())` when a handler invokes `proceed`.
pub fn cerror<C: Condition>(condition: C) -> ConditionResult<()> {
    with_restarts(Restarts::new().restart(PROCEED, |_: ()| ()), || {
        error(condition)
    })
}

/// Signal `condition`; report it unless a handler invokes `muffle`
///
/// The report goes wherever the configured [`WarningOutput`] points.
pub fn warn<C: Condition>(condition: C) -> ConditionResult<()> {
    let muffled = with_restarts(Restarts::new().restart(MUFFLE, |_: ()| true), || {
        signal_dyn(&condition)?;
        Ok(false)
    })?;

    if !muffled {
        emit_warning(&condition);
    }
    Ok(())
}

fn emit_warning(condition: &dyn Condition) {
    match config().warning_output {
        WarningOutput::Stderr => eprintln!("warning: {}", condition.message()),
        WarningOutput::Tracing => tracing::warn!(
            condition = %condition.condition_type(),
            "{}",
            condition.message()
        ),
        WarningOutput::Silent => {}
        WarningOutput::Custom(sink) => sink(condition),
    }
}

/// Handler that invokes the restart `name` with no argument
pub fn invoker(
    name: impl Into<String>,
) -> impl Fn(&dyn Condition) -> ConditionResult<()> + Clone + Send + Sync + 'static {
    let name = name.into();
    move |_: &dyn Condition| invoke_restart(name.as_str(), ())
}

/// Handler invoking `proceed`, for use with [`cerror`]
pub fn proceed(_: &dyn Condition) -> ConditionResult<()> {
    invoke_restart(PROCEED, ())
}

/// Handler invoking `muffle`, for use with [`warn`]
pub fn muffle(_: &dyn Condition) -> ConditionResult<()> {
    invoke_restart(MUFFLE, ())
}

/// Invoke the innermost `use_value` restart with `value`
pub fn use_value<R, V: Any + Send>(value: V) -> ConditionResult<R> {
    invoke_restart(USE_VALUE, value)
}

/// Condition translation table for [`resignal_in`]
#[derive(Default, Clone)]
pub struct Resignal {
    handlers: Handlers,
}

impl Resignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `convert(c)` with [`error`] whenever a `Source` is signaled
    pub fn map<Source, Target, F>(self, convert: F) -> Self
    where
        Source: Condition,
        Target: Condition,
        F: Fn(&Source) -> Target + Send + Sync + 'static,
    {
        Self {
            handlers: self
                .handlers
                .on::<Source, _>(move |condition| error(convert(condition))),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Resignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resignal")
            .field("mappings", &self.handlers.len())
            .finish()
    }
}

/// Run `body`, translating conditions according to `mapping`
///
/// Useful at a library boundary: the library's conditions leave `body` as
/// domain conditions. A translated condition that no outer handler resolves
/// ends as `ControlError::Unhandled`.
pub fn resignal_in<T>(
    mapping: Resignal,
    body: impl FnOnce() -> ConditionResult<T>,
) -> ConditionResult<T> {
    with_handlers(mapping.handlers, body)
}

/// Outermost boundary of a program using conditions
///
/// Turns the result of `body` into a plain `Result`.
///
/// # Panics
///
/// If a restart transfer escapes `body`; its target frame cannot be live
/// outside it.
pub fn toplevel<T>(body: impl FnOnce() -> ConditionResult<T>) -> Result<T, ControlError> {
    match body() {
        Ok(value) => Ok(value),
        Err(Unwind::Control(err)) => Err(err),
        Err(Unwind::Transfer(transfer)) => panic!("{} escaped to the top level", transfer),
    }
}
