/*!
 * Signals Module
 * Conditions, handler frames and signal delivery
 */

mod condition;
mod delivery;
mod handler;

// Re-export public API
pub use condition::{AsAny, Condition};
pub use delivery::{signal, signal_dyn};
pub use handler::{
    available_handlers, with_handlers, HandlerBinding, HandlerFn, HandlerFrame, HandlerInfo,
    Handlers,
};
