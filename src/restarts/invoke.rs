/*!
 * Restart Invocation
 *
 * Resolving restarts by name and starting the targeted unwind towards the
 * scope that owns them.
 */

use super::frame::RestartHandle;
use crate::context::restart_frames;
use crate::core::errors::{ConditionResult, ControlError, Unwind};
use crate::core::types::{FrameId, TypeTag};
use crate::protocols::error;
use std::any::Any;
use std::fmt;
use tracing::debug;

/// Control transfer in flight towards a restart frame
///
/// Produced by [`invoke_restart`] and consumed by the `with_restarts` scope
/// owning `target`. Carried as `Unwind::Transfer`; never a user error.
pub struct Transfer {
    target: FrameId,
    index: usize,
    restart: String,
    argument: Box<dyn Any + Send>,
}

impl Transfer {
    pub fn target(&self) -> FrameId {
        self.target
    }

    pub fn restart(&self) -> &str {
        &self.restart
    }

    pub(crate) fn into_parts(self) -> (FrameId, usize, String, Box<dyn Any + Send>) {
        (self.target, self.index, self.restart, self.argument)
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("target", &self.target)
            .field("index", &self.index)
            .field("restart", &self.restart)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transfer to restart `{}` in {}", self.restart, self.target)
    }
}

/// What `invoke_restart` should resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartTarget {
    /// Innermost visible restart with this name
    Name(String),
    /// One specific restart, e.g. from `find_restart`
    Handle(RestartHandle),
}

impl From<&str> for RestartTarget {
    fn from(name: &str) -> Self {
        RestartTarget::Name(name.to_string())
    }
}

impl From<String> for RestartTarget {
    fn from(name: String) -> Self {
        RestartTarget::Name(name)
    }
}

impl From<RestartHandle> for RestartTarget {
    fn from(handle: RestartHandle) -> Self {
        RestartTarget::Handle(handle)
    }
}

impl From<&RestartHandle> for RestartTarget {
    fn from(handle: &RestartHandle) -> Self {
        RestartTarget::Handle(handle.clone())
    }
}

/// Innermost visible restart named `name`
///
/// Pure query: repeated calls with no intervening scope change return the
/// same handle.
pub fn find_restart(name: &str) -> Option<RestartHandle> {
    restart_frames().find_map(|frame| frame.position(name).and_then(|index| frame.handle(index)))
}

/// Every visible restart, innermost frame first
///
/// Shadowed restarts are included; use the handle's frame to tell them apart.
pub fn available_restarts() -> Vec<RestartHandle> {
    restart_frames()
        .flat_map(|frame| (0..frame.bindings().len()).filter_map(move |i| frame.handle(i)))
        .collect()
}

/// Transfer control to a restart
///
/// Never returns `Ok`. On success the result is the transfer itself, which the
/// caller propagates with `?`. An unknown name or a wrong argument type is
/// raised with [`error`], so outer handlers may still intercept it.
///
/// # Panics
///
/// If `target` is a handle whose scope has already exited.
pub fn invoke_restart<R, A>(target: impl Into<RestartTarget>, argument: A) -> ConditionResult<R>
where
    A: Any + Send,
{
    let handle = match target.into() {
        RestartTarget::Name(name) => match find_restart(&name) {
            Some(handle) => handle,
            None => return error(ControlError::NoSuchRestart(name)),
        },
        RestartTarget::Handle(handle) => {
            if !handle.is_live() {
                panic!("restart handle {} used after its scope exited", handle);
            }
            handle
        }
    };

    let found = TypeTag::of::<A>();
    if handle.argument() != found {
        return error(ControlError::ArgumentMismatch {
            restart: handle.name().to_string(),
            expected: handle.argument().name().to_string(),
            found: found.name().to_string(),
        });
    }

    debug!(restart = %handle.name(), frame = %handle.frame(), "Invoking restart");
    Err(Unwind::Transfer(Transfer {
        target: handle.frame(),
        index: handle.index(),
        restart: handle.name().to_string(),
        argument: Box::new(argument),
    }))
}
