//! Registration entries and their creation strategies.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use interject_core::{Instance, Result, TypeKey};

use crate::key::ServiceKey;
use crate::registry::Registry;

/// Factory invoked with the registry on every resolution.
pub type FactoryFn = dyn Fn(&Registry) -> Result<Option<Instance>> + Send + Sync;

/// How a registration produces its service.
#[derive(Clone)]
pub enum Strategy {
    /// A shared object handed out as-is.
    Instance(Instance),
    /// A factory, called on every resolution.
    Factory {
        /// The factory.
        create: Arc<FactoryFn>,
        /// Identity for duplicate detection: the factory's type, when it is
        /// zero-sized (fn items and non-capturing closures).
        identity: Option<TypeId>,
    },
    /// A described type, built through one of its constructors.
    Implementation(TypeKey),
}

impl Strategy {
    /// Whether registering `other` would duplicate `self`.
    pub fn same_as(&self, other: &Strategy) -> bool {
        match (self, other) {
            (Self::Instance(a), Self::Instance(b)) => a.same_target(b),
            (
                Self::Factory {
                    identity: Some(a), ..
                },
                Self::Factory {
                    identity: Some(b), ..
                },
            ) => a == b,
            (Self::Implementation(a), Self::Implementation(b)) => a == b,
            _ => false,
        }
    }

    /// Short label: `instance`, `factory` or `implementation`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Factory { .. } => "factory",
            Self::Implementation(_) => "implementation",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(instance) => write!(f, "Instance({instance:?})"),
            Self::Factory { identity, .. } => write!(f, "Factory(dedup={})", identity.is_some()),
            Self::Implementation(key) => write!(f, "Implementation({key})"),
        }
    }
}

/// One registered way to produce a service.
///
/// The strategy is fixed; name, key, interception flag and aspect list are
/// set afterwards through the [`Registration`](crate::Registration) handle.
pub struct RegistrationEntry {
    service: TypeKey,
    strategy: Strategy,
    name: RwLock<Option<String>>,
    key: RwLock<Option<ServiceKey>>,
    aop: AtomicBool,
    aspects: RwLock<Vec<TypeKey>>,
}

impl RegistrationEntry {
    /// New entry for `service`.
    pub fn new(service: TypeKey, strategy: Strategy, aop: bool) -> Self {
        Self {
            service,
            strategy,
            name: RwLock::new(None),
            key: RwLock::new(None),
            aop: AtomicBool::new(aop),
            aspects: RwLock::new(Vec::new()),
        }
    }

    /// The service type this entry is registered under.
    pub fn service(&self) -> &TypeKey {
        &self.service
    }

    /// The creation strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Registration name.
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Registration key.
    pub fn key(&self) -> Option<ServiceKey> {
        self.key.read().clone()
    }

    /// Whether resolutions hand out a wrapper.
    pub fn is_aop(&self) -> bool {
        self.aop.load(Ordering::Acquire)
    }

    /// Registration-level aspect types, in binding order.
    pub fn aspects(&self) -> Vec<TypeKey> {
        self.aspects.read().clone()
    }

    pub(crate) fn set_name(&self, name: String) {
        *self.name.write() = Some(name);
    }

    pub(crate) fn set_key(&self, key: ServiceKey) {
        *self.key.write() = Some(key);
    }

    pub(crate) fn set_aop(&self, enabled: bool) {
        self.aop.store(enabled, Ordering::Release);
    }

    pub(crate) fn add_aspect(&self, aspect_type: TypeKey) -> bool {
        let mut aspects = self.aspects.write();
        if aspects.contains(&aspect_type) {
            return false;
        }
        aspects.push(aspect_type);
        true
    }

    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.name.read().as_deref() == Some(name)
    }

    pub(crate) fn has_key(&self, key: &ServiceKey) -> bool {
        self.key.read().as_ref() == Some(key)
    }
}

impl fmt::Display for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Implementation(key) => write!(f, "implementation {key}")?,
            Strategy::Instance(instance) => write!(f, "instance {}", instance.type_key())?,
            Strategy::Factory { .. } => write!(f, "factory")?,
        }
        if let Some(name) = self.name() {
            write!(f, " name={name:?}")?;
        }
        if let Some(key) = self.key() {
            write!(f, " key={key:?}")?;
        }
        if self.is_aop() {
            write!(f, " aop")?;
        }
        let aspects = self.aspects();
        if !aspects.is_empty() {
            let names: Vec<String> = aspects.iter().map(TypeKey::name).collect();
            write!(f, " aspects=[{}]", names.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("service", &self.service)
            .field("strategy", &self.strategy)
            .field("name", &self.name())
            .field("key", &self.key())
            .field("aop", &self.is_aop())
            .field("aspects", &self.aspects())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn factory(identity: Option<TypeId>) -> Strategy {
        Strategy::Factory {
            create: Arc::new(|_: &Registry| -> Result<Option<Instance>> { Ok(None) }),
            identity,
        }
    }

    #[test]
    fn test_instance_identity_is_pointer_identity() {
        let shared = Arc::new(5u32);
        let a = Strategy::Instance(Instance::from_arc(shared.clone()));
        let b = Strategy::Instance(Instance::from_arc(shared));
        let c = Strategy::Instance(Instance::new(5u32));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }

    #[test]
    fn test_factory_identity() {
        let id = Some(TypeId::of::<fn()>());
        assert!(factory(id).same_as(&factory(id)));
        assert!(!factory(None).same_as(&factory(None)));
        assert!(!factory(id).same_as(&factory(Some(TypeId::of::<u8>()))));
    }

    #[test]
    fn test_implementation_identity() {
        let a = Strategy::Implementation(TypeKey::of::<u8>());
        assert!(a.same_as(&Strategy::Implementation(TypeKey::of::<u8>())));
        assert!(!a.same_as(&Strategy::Implementation(TypeKey::of::<u16>())));
        assert!(!a.same_as(&factory(None)));
    }

    #[test]
    fn test_entry_metadata() {
        let entry = RegistrationEntry::new(
            TypeKey::of::<u8>(),
            Strategy::Implementation(TypeKey::of::<u8>()),
            false,
        );
        entry.set_name("primary".into());
        entry.set_key(ServiceKey::new(7u8));
        entry.set_aop(true);
        assert!(entry.add_aspect(TypeKey::of::<String>()));
        assert!(!entry.add_aspect(TypeKey::of::<String>()));

        assert!(entry.has_name("primary"));
        assert!(!entry.has_name("secondary"));
        assert!(entry.has_key(&ServiceKey::new(7u8)));
        assert!(entry.is_aop());
        assert_eq!(entry.aspects().len(), 1);

        let shown = entry.to_string();
        assert!(shown.starts_with("implementation u8"));
        assert!(shown.contains("name=\"primary\""));
        assert!(shown.contains(" aop"));
    }
}
