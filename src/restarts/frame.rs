/*!
 * Restart Frames
 *
 * A frame lists the restarts one `with_restarts` scope offers. The frame
 * itself only carries names and argument types; the functions stay with the
 * scope that owns them, so they may borrow from the caller.
 */

use crate::context::{is_live_restart, StackFrame};
use crate::core::config::config;
use crate::core::errors::{ConditionResult, ControlError};
use crate::core::types::{FrameId, TypeTag};
use std::any::Any;
use std::fmt;

/// Name and argument type of one restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartBinding {
    name: String,
    argument: TypeTag,
}

impl RestartBinding {
    pub fn new(name: impl Into<String>, argument: TypeTag) -> Self {
        Self {
            name: name.into(),
            argument,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> TypeTag {
        self.argument
    }
}

/// Restarts established by one scope
#[derive(Debug)]
pub struct RestartFrame {
    id: FrameId,
    bindings: Vec<RestartBinding>,
}

impl RestartFrame {
    pub(crate) fn new(bindings: Vec<RestartBinding>) -> Self {
        Self {
            id: FrameId::next(),
            bindings,
        }
    }

    pub fn bindings(&self) -> &[RestartBinding] {
        &self.bindings
    }

    /// Index of the binding called `name`
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.bindings.iter().position(|b| b.name == name)
    }

    pub(crate) fn handle(&self, index: usize) -> Option<RestartHandle> {
        self.bindings.get(index).map(|binding| RestartHandle {
            frame: self.id,
            index,
            name: binding.name.clone(),
            argument: binding.argument,
        })
    }
}

impl StackFrame for RestartFrame {
    #[inline]
    fn id(&self) -> FrameId {
        self.id
    }
}

/// Resolved reference to one restart of one live frame
///
/// Only valid while the owning `with_restarts` scope is running. Invoking a
/// handle after its scope exited panics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestartHandle {
    frame: FrameId,
    index: usize,
    name: String,
    argument: TypeTag,
}

impl RestartHandle {
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> TypeTag {
        self.argument
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Check if the owning frame is still on this context's stack
    pub fn is_live(&self) -> bool {
        is_live_restart(self.frame)
    }
}

impl fmt::Display for RestartHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) in {}", self.name, self.argument, self.frame)
    }
}

pub(crate) type RestartFn<'a, T> =
    Box<dyn FnOnce(Box<dyn Any + Send>) -> ConditionResult<T> + 'a>;

/// Builder for the restarts of one `with_restarts` scope
///
/// Every restart produces the scope's result type `T`. Restarts taking no
/// argument are declared with `A = ()`.
///
/// # Example
///
/// ```
/// use conditions::Restarts;
///
/// let restarts = Restarts::new()
///     .restart("use_value", |x: i64| x)
///     .restart("double", |x: i64| 2 * x);
/// assert_eq!(restarts.names(), vec!["use_value", "double"]);
/// ```
pub struct Restarts<'a, T> {
    entries: Vec<(RestartBinding, RestartFn<'a, T>)>,
}

impl<'a, T> Default for Restarts<'a, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, T: 'a> Restarts<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare restart `name` taking `A`
    pub fn restart<A, F>(self, name: impl Into<String>, function: F) -> Self
    where
        A: Any + Send,
        F: FnOnce(A) -> T + 'a,
    {
        self.restart_with(name, move |argument: A| Ok(function(argument)))
    }

    /// Declare a restart whose function may itself signal or transfer
    pub fn restart_with<A, F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        A: Any + Send,
        F: FnOnce(A) -> ConditionResult<T> + 'a,
    {
        let binding = RestartBinding::new(name, TypeTag::of::<A>());
        let restart = binding.name.clone();
        let erased: RestartFn<'a, T> = Box::new(move |argument: Box<dyn Any + Send>| {
            match argument.downcast::<A>() {
                Ok(argument) => function(*argument),
                Err(_) => Err(ControlError::ArgumentMismatch {
                    restart,
                    expected: TypeTag::of::<A>().name().to_string(),
                    found: "unknown".to_string(),
                }
                .into()),
            }
        });
        self.entries.push((binding, erased));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(b, _)| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the names and split into frame and functions
    pub(crate) fn into_frame(self) -> Result<(RestartFrame, Vec<RestartFn<'a, T>>), ControlError> {
        let validate = config().validate_restart_names;
        let mut bindings: Vec<RestartBinding> = Vec::with_capacity(self.entries.len());
        let mut functions = Vec::with_capacity(self.entries.len());

        for (binding, function) in self.entries {
            if validate && !is_valid_restart_name(&binding.name) {
                return Err(ControlError::InvalidRestartName(binding.name));
            }
            if bindings.iter().any(|b| b.name == binding.name) {
                return Err(ControlError::DuplicateRestart(binding.name));
            }
            bindings.push(binding);
            functions.push(function);
        }

        Ok((RestartFrame::new(bindings), functions))
    }
}

impl<'a, T> fmt::Debug for Restarts<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(b, _)| b))
            .finish()
    }
}

/// Check `name` against `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_restart_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_name_validation() {
        assert!(is_valid_restart_name("use_value"));
        assert!(is_valid_restart_name("_private"));
        assert!(is_valid_restart_name("retry2"));
        assert!(!is_valid_restart_name(""));
        assert!(!is_valid_restart_name("2retry"));
        assert!(!is_valid_restart_name("use-value"));
        assert!(!is_valid_restart_name("naïve"));
    }

    #[test]
    fn test_into_frame_keeps_order() {
        let (frame, functions) = Restarts::new()
            .restart("first", |x: i32| x)
            .restart("second", |_: ()| 0)
            .into_frame()
            .unwrap();

        let names: Vec<_> = frame.bindings().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(functions.len(), 2);
        assert_eq!(frame.position("second"), Some(1));
        assert_eq!(frame.bindings()[1].argument(), TypeTag::of::<()>());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Restarts::new()
            .restart("retry", |_: ()| 1)
            .restart("retry", |_: ()| 2)
            .into_frame()
            .err()
            .unwrap();
        assert_eq!(err, ControlError::DuplicateRestart("retry".into()));
    }

    #[test]
    fn test_erased_function_downcasts() {
        let (_, mut functions) = Restarts::new()
            .restart("double", |x: i64| x * 2)
            .into_frame()
            .unwrap();
        let double = functions.remove(0);
        assert_eq!(double(Box::new(21_i64)).unwrap(), 42);
    }

    #[test]
    fn test_handle_from_frame() {
        let frame = RestartFrame::new(vec![RestartBinding::new("skip", TypeTag::of::<()>())]);
        let handle = frame.handle(0).unwrap();
        assert_eq!(handle.name(), "skip");
        assert_eq!(handle.frame(), frame.id());
        assert!(frame.handle(1).is_none());
        assert!(!handle.is_live());
    }
}
