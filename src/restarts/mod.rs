/*!
 * Restarts Module
 * Restart frames, scopes and targeted control transfer
 */

mod frame;
mod invoke;
mod scope;

pub use frame::{is_valid_restart_name, RestartBinding, RestartFrame, RestartHandle, Restarts};
pub use invoke::{available_restarts, find_restart, invoke_restart, RestartTarget, Transfer};
pub use scope::with_restarts;
