//! The per-call interception record.

use std::any::Any;
use std::fmt;
use std::time::{Duration, Instant};

use interject_core::TypeKey;

/// One argument of an intercepted call, rendered for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: &'static str,
    value: String,
}

impl Argument {
    /// Render `value` with its `Debug` representation.
    pub fn new<T: fmt::Debug + ?Sized>(name: &'static str, value: &T) -> Self {
        Self {
            name,
            value: format!("{value:?}"),
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rendered value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Everything aspects see about one intercepted call.
///
/// Built fresh for every call that has at least one aspect factory bound,
/// and dropped when the call returns.
pub struct InterceptionContext {
    target_type: TypeKey,
    method: &'static str,
    arguments: Vec<Argument>,
    state: Option<Box<dyn Any + Send>>,
    aspects: Vec<TypeKey>,
    started: Instant,
}

impl InterceptionContext {
    /// Start a context for `method` on `target_type`.
    pub fn new(target_type: TypeKey, method: &'static str, arguments: Vec<Argument>) -> Self {
        Self {
            target_type,
            method,
            arguments,
            state: None,
            aspects: Vec::new(),
            started: Instant::now(),
        }
    }

    /// The intercepted type.
    pub fn target_type(&self) -> &TypeKey {
        &self.target_type
    }

    /// The intercepted method.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// `Type::method`, for log lines.
    pub fn signature(&self) -> String {
        format!("{}::{}", self.target_type, self.method)
    }

    /// Call arguments in declaration order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Argument by parameter name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Aspect types materialized for this call, in binding order.
    pub fn aspects(&self) -> &[TypeKey] {
        &self.aspects
    }

    pub(crate) fn push_aspect(&mut self, aspect_type: TypeKey) {
        self.aspects.push(aspect_type);
    }

    /// Time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Put a value into the user state slot, replacing any previous one.
    pub fn set_state<T: Any + Send>(&mut self, value: T) {
        self.state = Some(Box::new(value));
    }

    /// Borrow the user state as `T`.
    pub fn state<T: Any + Send>(&self) -> Option<&T> {
        self.state.as_ref()?.downcast_ref::<T>()
    }

    /// Mutably borrow the user state as `T`.
    pub fn state_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.state.as_mut()?.downcast_mut::<T>()
    }

    /// Take the user state out if it is a `T`.
    pub fn take_state<T: Any + Send>(&mut self) -> Option<T> {
        match self.state.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.state = Some(other);
                None
            }
        }
    }
}

impl fmt::Debug for InterceptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionContext")
            .field("target_type", &self.target_type)
            .field("method", &self.method)
            .field("arguments", &self.arguments)
            .field("state", &self.state.is_some())
            .field("aspects", &self.aspects)
            .finish()
    }
}
