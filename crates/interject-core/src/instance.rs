//! Type-erased shared object handles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeKey;
use crate::{Error, Result};

/// A shared object viewed as one particular type.
///
/// An `Instance` always holds an `Arc<T>` for some `T: ?Sized`, so it can
/// carry concrete values (`Arc<FooImpl>`) and trait objects
/// (`Arc<dyn Foo>`) alike. The [`TypeKey`] records which `T` that is.
///
/// Two instances viewing the same allocation through different types
/// (e.g. the concrete value and an interface view of it) report the same
/// [`Instance::addr`].
#[derive(Clone)]
pub struct Instance {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
    addr: usize,
}

impl Instance {
    /// Move `value` into a new shared instance.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc`, keyed by `T`.
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::with_key(TypeKey::of::<T>(), value)
    }

    /// Wrap an existing `Arc` under an explicit key.
    ///
    /// Used for generic types, whose structural key differs from the Rust
    /// `TypeId` of the monomorphized type.
    pub fn with_key<T: ?Sized + Send + Sync + 'static>(key: TypeKey, value: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&value) as *const () as usize;
        Self {
            key,
            value: Arc::new(value),
            addr,
        }
    }

    /// The type this instance is viewed as.
    pub fn type_key(&self) -> &TypeKey {
        &self.key
    }

    /// Address of the underlying object.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Whether both handles point at the same object.
    pub fn same_target(&self, other: &Instance) -> bool {
        self.addr == other.addr
    }

    /// Get the held `Arc<T>` if this instance was created from one.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Like [`Instance::downcast`], but reports a cast error on mismatch.
    pub fn try_downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.downcast::<T>()
            .ok_or_else(|| Error::cast(self.key.name(), std::any::type_name::<T>()))
    }

    /// Re-key this instance without touching the object.
    pub fn rekey(mut self, key: TypeKey) -> Self {
        self.key = key;
        self
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.key)
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}
