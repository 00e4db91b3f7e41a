/*!
 * Handler Frames
 * Bindings from condition types to callbacks, established with `with_handlers`
 */

use super::condition::Condition;
use crate::context::{handler_frames, push_handler_frame, StackFrame};
use crate::core::errors::ConditionResult;
use crate::core::types::{FrameId, TypeSpec, TypeTag};
use std::fmt;
use std::sync::Arc;

/// Handler callback function type
///
/// `Ok(())` declines; the walk continues outward. Returning `Err` (usually
/// the result of `invoke_restart`) ends the walk.
pub type HandlerFn = Arc<dyn Fn(&dyn Condition) -> ConditionResult<()> + Send + Sync>;

/// One `(types, callback)` pair
#[derive(Clone)]
pub struct HandlerBinding {
    spec: TypeSpec,
    callback: HandlerFn,
}

impl HandlerBinding {
    pub fn new(spec: TypeSpec, callback: HandlerFn) -> Self {
        Self { spec, callback }
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    #[inline]
    pub(crate) fn call(&self, condition: &dyn Condition) -> ConditionResult<()> {
        (self.callback)(condition)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Handler bindings pushed and popped as a unit
#[derive(Debug)]
pub struct HandlerFrame {
    id: FrameId,
    bindings: Vec<HandlerBinding>,
}

impl HandlerFrame {
    pub(crate) fn new(bindings: Vec<HandlerBinding>) -> Self {
        Self {
            id: FrameId::next(),
            bindings,
        }
    }

    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    /// Bindings covering `ty`, in declaration order
    pub(crate) fn matching<'a>(
        &'a self,
        ty: &'a TypeTag,
    ) -> impl Iterator<Item = &'a HandlerBinding> + 'a {
        self.bindings.iter().filter(move |b| b.spec.matches(ty))
    }
}

impl StackFrame for HandlerFrame {
    #[inline]
    fn id(&self) -> FrameId {
        self.id
    }
}

/// Builder for one handler frame
///
/// # Example
///
/// ```
/// use conditions::{invoker, Condition, Handlers};
///
/// #[derive(Debug)]
/// struct Retry;
/// impl Condition for Retry {}
///
/// let handlers = Handlers::new()
///     .on::<Retry, _>(|_| Ok(()))
///     .bind_type::<Retry>(invoker("again"));
/// assert_eq!(handlers.len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Handlers {
    bindings: Vec<HandlerBinding>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an untyped callback to every type in `spec`
    pub fn bind<F>(mut self, spec: impl Into<TypeSpec>, callback: F) -> Self
    where
        F: Fn(&dyn Condition) -> ConditionResult<()> + Send + Sync + 'static,
    {
        self.bindings
            .push(HandlerBinding::new(spec.into(), Arc::new(callback)));
        self
    }

    /// Bind an untyped callback to exactly `C`
    pub fn bind_type<C: Condition>(
        self,
        callback: impl Fn(&dyn Condition) -> ConditionResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.bind(TypeSpec::of::<C>(), callback)
    }

    /// Bind a typed callback to exactly `C`
    pub fn on<C, F>(self, callback: F) -> Self
    where
        C: Condition,
        F: Fn(&C) -> ConditionResult<()> + Send + Sync + 'static,
    {
        self.bind(TypeSpec::of::<C>(), move |condition: &dyn Condition| {
            match condition.downcast_ref::<C>() {
                Some(condition) => callback(condition),
                None => Ok(()),
            }
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Run `body` with `handlers` in effect
///
/// The frame is popped when `body` returns, errors or panics.
pub fn with_handlers<T>(
    handlers: Handlers,
    body: impl FnOnce() -> ConditionResult<T>,
) -> ConditionResult<T> {
    let frame = Arc::new(HandlerFrame::new(handlers.bindings));
    let _guard = push_handler_frame(frame);
    body()
}

/// Description of one visible handler binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub frame: FrameId,
    /// Position of the frame on the handler stack, 0 being outermost
    pub depth: usize,
    pub types: TypeSpec,
}

/// Visible handler bindings, innermost frame first
pub fn available_handlers() -> Vec<HandlerInfo> {
    let frames = handler_frames();
    let total = frames.len();
    let mut infos = Vec::new();
    for (offset, frame) in frames.enumerate() {
        let depth = total - 1 - offset;
        infos.extend(frame.bindings.iter().map(|binding| HandlerInfo {
            frame: frame.id,
            depth,
            types: binding.spec.clone(),
        }));
    }
    infos
}
