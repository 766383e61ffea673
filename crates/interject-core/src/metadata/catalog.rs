//! The type catalog: every [`TypeInfo`] the runtime knows about.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use super::type_info::TypeInfo;
use crate::instance::Instance;
use crate::types::TypeKey;
use crate::{Error, Result};

/// Shared, thread-safe store of type descriptions.
///
/// Closed generic types need not be described up front: asking for
/// `Repository<User>` closes the described `Repository<_>` definition on
/// first use and caches the result.
#[derive(Default)]
pub struct Catalog {
    types: RwLock<HashMap<TypeKey, Arc<TypeInfo>>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a description.
    pub fn describe(&self, info: TypeInfo) -> Arc<TypeInfo> {
        let info = Arc::new(info);
        log::trace!("describe {}", info.key());
        self.types.write().insert(info.key().clone(), info.clone());
        info
    }

    /// Look up a description, closing generic definitions on demand.
    pub fn get(&self, key: &TypeKey) -> Option<Arc<TypeInfo>> {
        if let Some(info) = self.types.read().get(key) {
            return Some(info.clone());
        }

        let definition = key.generic_definition()?;
        let open = self.types.read().get(definition).cloned()?;
        let closed = open.close(key.generic_args())?;

        let mut types = self.types.write();
        let entry = types
            .entry(key.clone())
            .or_insert_with(|| Arc::new(closed));
        log::trace!("closed {} from {}", key, definition);
        Some(entry.clone())
    }

    /// Describe-or-fail lookup.
    pub fn require(&self, key: &TypeKey) -> Result<Arc<TypeInfo>> {
        self.get(key)
            .ok_or_else(|| Error::not_found(format!("type {key} is not described")))
    }

    /// Whether `key` is described (or closable).
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of cached descriptions.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether nothing is described.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Described keys, sorted by name.
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.types.read().keys().cloned().collect();
        keys.sort_by_key(TypeKey::name);
        keys
    }

    /// Every interface `key` implements, directly or through interface
    /// inheritance, in breadth-first order.
    pub fn interfaces_of(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([key.clone()]);
        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(&current) else {
                continue;
            };
            for iface in info.interfaces() {
                if seen.insert(iface.interface().clone()) {
                    order.push(iface.interface().clone());
                    queue.push_back(iface.interface().clone());
                }
            }
        }
        order
    }

    /// Whether a value of type `from` can be used where `to` is expected.
    pub fn is_assignable(&self, from: &TypeKey, to: &TypeKey) -> bool {
        from == to || self.interfaces_of(from).contains(to)
    }

    /// View `instance` as `to`, following interface casts transitively.
    pub fn cast(&self, instance: &Instance, to: &TypeKey) -> Result<Instance> {
        if instance.type_key() == to {
            return Ok(instance.clone());
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([instance.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.type_key().clone()) {
                continue;
            }
            let Some(info) = self.get(current.type_key()) else {
                continue;
            };
            for iface in info.interfaces() {
                let Some(view) = iface.cast(&current) else {
                    continue;
                };
                if iface.interface() == to {
                    return Ok(view);
                }
                queue.push_back(view);
            }
        }

        Err(Error::cast(instance.type_key().name(), to.name()))
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("types", &self.len()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> String;
    }

    trait Greeter: Named {
        fn greet(&self) -> String {
            format!("hello from {}", self.name())
        }
    }

    struct Bot;

    impl Named for Bot {
        fn name(&self) -> String {
            "bot".into()
        }
    }

    impl Greeter for Bot {}

    fn catalog() -> Catalog {
        let catalog = Catalog::new();
        catalog.describe(
            TypeInfo::class::<Bot>()
                .default_constructor(|| Bot)
                .implements::<dyn Greeter, _>(|b| b as Arc<dyn Greeter>)
                .build(),
        );
        catalog.describe(
            TypeInfo::interface::<dyn Greeter>()
                .implements::<dyn Named, _>(|g| g as Arc<dyn Named>)
                .build(),
        );
        catalog.describe(TypeInfo::interface::<dyn Named>().build());
        catalog
    }

    #[test]
    fn test_describe_and_get() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains(&TypeKey::of::<Bot>()));
        assert!(catalog.get(&TypeKey::of::<String>()).is_none());
        assert!(catalog.require(&TypeKey::of::<String>()).is_err());
    }

    #[test]
    fn test_transitive_assignability() {
        let catalog = catalog();
        let bot = TypeKey::of::<Bot>();
        assert!(catalog.is_assignable(&bot, &bot));
        assert!(catalog.is_assignable(&bot, &TypeKey::of::<dyn Greeter>()));
        assert!(catalog.is_assignable(&bot, &TypeKey::of::<dyn Named>()));
        assert!(!catalog.is_assignable(&TypeKey::of::<dyn Named>(), &bot));
    }

    #[test]
    fn test_transitive_cast() {
        let catalog = catalog();
        let bot = Instance::new(Bot);
        let named = catalog.cast(&bot, &TypeKey::of::<dyn Named>()).unwrap();
        assert_eq!(named.downcast::<dyn Named>().unwrap().name(), "bot");
        assert!(named.same_target(&bot));

        let err = catalog.cast(&bot, &TypeKey::of::<String>()).unwrap_err();
        assert!(matches!(err, Error::Cast { .. }));
    }

    #[test]
    fn test_closed_generic_is_closed_on_demand() {
        let catalog = Catalog::new();
        let open = TypeKey::open("Boxed", 1);
        catalog.describe(
            TypeInfo::open_class(&open)
                .closing(|key, args| {
                    (args[0] == TypeKey::of::<u8>()).then(|| {
                        TypeInfo::class::<Vec<u8>>()
                            .key(key.clone())
                            .default_constructor(Vec::new)
                            .build()
                    })
                })
                .build(),
        );

        let closed = open.close(&[TypeKey::of::<u8>()]).unwrap();
        let info = catalog.get(&closed).unwrap();
        assert_eq!(info.key(), &closed);
        assert_eq!(catalog.len(), 2);
        assert!(Arc::ptr_eq(&info, &catalog.get(&closed).unwrap()));

        let unknown = open.close(&[TypeKey::of::<u16>()]).unwrap();
        assert!(catalog.get(&unknown).is_none());
    }
}
