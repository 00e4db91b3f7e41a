/*!
 * Conditions
 * Values that can be signaled to the handler stack
 */

use crate::core::errors::ControlError;
use crate::core::types::TypeTag;
use std::any::Any;
use std::fmt;

/// Type-erasure support for conditions
///
/// Implemented for every eligible type; never implement it by hand.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Descriptor of the concrete type
    fn type_tag(&self) -> TypeTag;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }
}

/// A signalable value
///
/// Handlers select conditions by their concrete type. Any payload the
/// handler needs lives in the type's fields.
///
/// # Example
///
/// ```
/// use conditions::Condition;
///
/// #[derive(Debug)]
/// struct OddNumber(i64);
///
/// impl Condition for OddNumber {}
/// ```
pub trait Condition: AsAny + fmt::Debug {
    /// Human readable description, used for warnings and unhandled errors
    fn message(&self) -> String {
        format!("{:?}", self)
    }
}

impl<'a> dyn Condition + 'a {
    /// Check if the concrete type is `C`
    #[inline]
    pub fn is<C: Condition>(&self) -> bool {
        self.as_any().is::<C>()
    }

    /// Borrow as the concrete type `C`
    #[inline]
    pub fn downcast_ref<C: Condition>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    /// Descriptor used for handler matching
    #[inline]
    pub fn condition_type(&self) -> TypeTag {
        self.type_tag()
    }
}

impl Condition for ControlError {
    fn message(&self) -> String {
        self.to_string()
    }
}
