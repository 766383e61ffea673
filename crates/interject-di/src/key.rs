//! Arbitrary registration keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

trait KeyValue: Any + Send + Sync + fmt::Debug {
    fn eq_dyn(&self, other: &dyn KeyValue) -> bool;
    fn hash_dyn(&self, state: &mut dyn Hasher);
    fn as_any(&self) -> &dyn Any;
}

impl<K: Any + Send + Sync + fmt::Debug + Eq + Hash> KeyValue for K {
    fn eq_dyn(&self, other: &dyn KeyValue) -> bool {
        other.as_any().downcast_ref::<K>() == Some(self)
    }

    fn hash_dyn(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<K>().hash(&mut state);
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased registration key: any `Eq + Hash + Debug` value.
///
/// Keys of different Rust types never compare equal, so `1u8` and `1u32`
/// are distinct keys.
#[derive(Clone)]
pub struct ServiceKey(Arc<dyn KeyValue>);

impl ServiceKey {
    /// Wrap a key value.
    pub fn new<K: Any + Send + Sync + fmt::Debug + Eq + Hash>(key: K) -> Self {
        Self(Arc::new(key))
    }

    /// Borrow the key as `K`.
    pub fn downcast_ref<K: Any>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref::<K>()
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_dyn(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
