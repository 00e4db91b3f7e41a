/*!
 * Conditions Library
 * Resumable error handling with dynamically scoped handlers and restarts
 *
 * Handlers run at the signal site without unwinding anything. Control only
 * leaves the signal site once a handler chooses a restart, and then unwinds
 * exactly to the `with_restarts` scope that established it.
 *
 * ```
 * use conditions::{invoke_restart, signal, with_handlers, with_restarts, Condition, Handlers, Restarts};
 *
 * #[derive(Debug)]
 * struct OddNumber(i64);
 * impl Condition for OddNumber {}
 *
 * let doubled = with_restarts(Restarts::new().restart("double", |x: i64| 2 * x), || {
 *     with_handlers(
 *         Handlers::new().on::<OddNumber, _>(|c| invoke_restart("double", c.0)),
 *         || {
 *             signal(OddNumber(3))?;
 *             Ok(3)
 *         },
 *     )
 * });
 * assert_eq!(doubled.unwrap(), 6);
 * ```
 */

pub mod context;
pub mod core;
pub mod monitoring;
pub mod protocols;
pub mod restarts;
pub mod signals;

// Re-exports
pub use crate::context::{depths, spawn, ContextJoinHandle, ContextSnapshot, DepthCheck, StackDepths};
pub use crate::core::{
    config, configure, ConditionResult, ConditionsConfig, ControlError, FrameId, TypeSpec, TypeTag,
    Unwind, WarningOutput, WarningSink,
};
pub use monitoring::init_tracing;
pub use protocols::{
    cerror, error, invoker, muffle, proceed, resignal_in, toplevel, use_value, warn, Resignal,
    MUFFLE, PROCEED, USE_VALUE,
};
pub use restarts::{
    available_restarts, find_restart, invoke_restart, with_restarts, RestartHandle, RestartTarget,
    Restarts, Transfer,
};
pub use signals::{
    available_handlers, signal, signal_dyn, with_handlers, Condition, HandlerInfo, Handlers,
};
