/*!
 * Core Types
 * Frame identities and runtime type descriptors shared by both dynamic stacks
 */

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of frame identities
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a pushed restart or handler frame
///
/// Allocated from a process-wide counter, so identities never repeat across
/// threads or across snapshots of the same context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(u64);

impl FrameId {
    /// Allocate a fresh identity
    #[inline]
    pub(crate) fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Runtime descriptor of a concrete Rust type
///
/// Used both for condition matching and for checking restart arguments.
/// Equality and hashing only look at the `TypeId`.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Descriptor for `T`
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying type id
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics only
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Condition types a handler binding responds to
///
/// Matching is exact: a binding fires only for the types it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// Exactly one condition type
    Single(TypeTag),
    /// Any of the listed condition types
    AnyOf(Vec<TypeTag>),
}

impl TypeSpec {
    /// Spec matching exactly `T`
    #[inline]
    pub fn of<T: Any>() -> Self {
        TypeSpec::Single(TypeTag::of::<T>())
    }

    /// Spec matching any of `types`
    pub fn any_of(types: impl IntoIterator<Item = TypeTag>) -> Self {
        TypeSpec::AnyOf(types.into_iter().collect())
    }

    /// Check whether a condition of type `ty` is covered
    #[inline]
    pub fn matches(&self, ty: &TypeTag) -> bool {
        match self {
            TypeSpec::Single(tag) => tag == ty,
            TypeSpec::AnyOf(tags) => tags.contains(ty),
        }
    }

    /// All listed types
    pub fn types(&self) -> &[TypeTag] {
        match self {
            TypeSpec::Single(tag) => std::slice::from_ref(tag),
            TypeSpec::AnyOf(tags) => tags,
        }
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Single(tag)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Single(tag) => write!(f, "{}", tag),
            TypeSpec::AnyOf(tags) => {
                f.write_str("(")?;
                for (i, tag) in tags.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", tag)?;
                }
                f.write_str(")")
            }
        }
    }
}
