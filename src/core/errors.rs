/*!
 * Error Types
 * Engine failures and the unwinding value carried through `?`
 */

use crate::restarts::Transfer;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of any operation that may divert control to a restart
pub type ConditionResult<T> = Result<T, Unwind>;

/// Engine-internal failures
///
/// Also a condition type: wherever one of these originates from a signaling
/// operation it is passed through `error`, so an outer handler can intercept it.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ControlError {
    #[error("No such restart: {0}")]
    #[diagnostic(
        code(control::no_such_restart),
        help("The restart is not in the dynamic extent of any enclosing with_restarts scope.")
    )]
    NoSuchRestart(String),

    #[error("Restart `{restart}` takes {expected}, invoked with {found}")]
    #[diagnostic(
        code(control::argument_mismatch),
        help("Pass exactly the argument type the restart function was declared with.")
    )]
    ArgumentMismatch {
        restart: String,
        expected: String,
        found: String,
    },

    #[error("Unhandled error condition {condition_type}: {message}")]
    #[diagnostic(
        code(control::unhandled),
        help("No handler invoked a restart for this condition. Bind one with with_handlers.")
    )]
    Unhandled {
        condition_type: String,
        message: String,
    },

    #[error("Invalid restart name: {0:?}")]
    #[diagnostic(
        code(control::invalid_restart_name),
        help("Restart names must be identifiers: a letter or underscore, then letters, digits or underscores.")
    )]
    InvalidRestartName(String),

    #[error("Restart `{0}` bound twice in one frame")]
    #[diagnostic(
        code(control::duplicate_restart),
        help("Names may shadow restarts of outer frames, but must be unique within a frame.")
    )]
    DuplicateRestart(String),
}

/// Why a guarded computation did not return normally
#[derive(Error, Debug)]
pub enum Unwind {
    /// A restart was chosen; unwinding towards the scope that owns it
    #[error("{0}")]
    Transfer(Transfer),

    /// An engine failure that nobody recovered from
    #[error(transparent)]
    Control(#[from] ControlError),
}

impl Unwind {
    /// Check if this is a control transfer in flight
    #[inline]
    pub fn is_transfer(&self) -> bool {
        matches!(self, Unwind::Transfer(_))
    }

    /// Borrow the engine failure, if this is one
    pub fn as_control(&self) -> Option<&ControlError> {
        match self {
            Unwind::Control(err) => Some(err),
            Unwind::Transfer(_) => None,
        }
    }

    /// Take the engine failure, if this is one
    pub fn into_control(self) -> Option<ControlError> {
        match self {
            Unwind::Control(err) => Some(err),
            Unwind::Transfer(_) => None,
        }
    }
}
