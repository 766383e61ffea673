//! Aspect bindings: turning aspect markers into factories.

use std::sync::Arc;

use interject_core::{Catalog, TypeKey};

use crate::aspect::{AspectConstructor, AspectFactory};

/// Ordered, duplicate-free list of aspect factories for one binding level
/// (type-level markers or a registration's aspect list).
#[derive(Clone, Default)]
pub struct AspectBindings {
    factories: Vec<Arc<dyn AspectFactory>>,
}

impl AspectBindings {
    /// Empty binding list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve aspect markers against the catalog.
    ///
    /// Markers that do not name a described aspect type are ignored, as are
    /// repeated aspect types.
    pub fn resolve(catalog: &Catalog, markers: &[TypeKey]) -> Self {
        let mut bindings = Self::new();
        for marker in markers {
            let constructor = catalog
                .get(marker)
                .and_then(|info| info.capability::<AspectConstructor>().cloned());
            match constructor {
                Some(constructor) => {
                    bindings.push(constructor.factory());
                }
                None => log::debug!("ignoring aspect marker {marker}: not an aspect type"),
            }
        }
        bindings
    }

    /// Append a factory unless its aspect type is already bound.
    pub fn push(&mut self, factory: Arc<dyn AspectFactory>) -> bool {
        if self.contains(factory.aspect_type()) {
            log::debug!("aspect {} already bound", factory.aspect_type());
            return false;
        }
        self.factories.push(factory);
        true
    }

    /// Whether `aspect_type` is bound.
    pub fn contains(&self, aspect_type: &TypeKey) -> bool {
        self.factories.iter().any(|f| f.aspect_type() == aspect_type)
    }

    /// Bound factories in binding order.
    pub fn factories(&self) -> &[Arc<dyn AspectFactory>] {
        &self.factories
    }

    /// Bound aspect types in binding order.
    pub fn aspect_types(&self) -> Vec<TypeKey> {
        self.factories
            .iter()
            .map(|f| f.aspect_type().clone())
            .collect()
    }

    /// Number of bound factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Static-then-dynamic concatenation. Each level is already free of
    /// duplicates; the same aspect type may appear once per level.
    pub fn chain(&self, dynamic: &AspectBindings) -> Vec<Arc<dyn AspectFactory>> {
        self.factories
            .iter()
            .chain(dynamic.factories.iter())
            .cloned()
            .collect()
    }
}

impl FromIterator<Arc<dyn AspectFactory>> for AspectBindings {
    fn from_iter<I: IntoIterator<Item = Arc<dyn AspectFactory>>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for factory in iter {
            bindings.push(factory);
        }
        bindings
    }
}

impl std::fmt::Debug for AspectBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.aspect_types()).finish()
    }
}
