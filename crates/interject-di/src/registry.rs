//! The service registry: registration and bookkeeping.
//!
//! Resolution lives in [`crate::resolver`]; both operate on the same
//! [`Registry`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use interject_aop::{ProxyBuilder, Synthesizer};
use interject_core::{
    BoxError, Catalog, Error, Instance, RegistryConfig, Result, TypeInfo, TypeKey,
};

use crate::entry::Strategy;
use crate::group::ServiceGroup;
use crate::handle::Registration;
use crate::hook::ResolveHook;

/// Maps service types to their registration groups and resolves them.
///
/// All methods take `&self`; a registry is meant to be shared across
/// threads behind an `Arc` (or used through [`Registry::global`]).
pub struct Registry {
    pub(crate) config: RegistryConfig,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) proxies: ProxyBuilder,
    pub(crate) groups: RwLock<HashMap<TypeKey, Arc<ServiceGroup>>>,
    pub(crate) hooks: RwLock<Vec<Arc<dyn ResolveHook>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry with default configuration.
    pub fn new() -> Self {
        Self::from_config(RegistryConfig::default())
    }

    /// Empty registry with its own catalog.
    pub fn from_config(config: RegistryConfig) -> Self {
        Self::with_catalog(Arc::new(Catalog::new()), config)
    }

    /// Registry over an existing catalog, e.g. one shared with a
    /// standalone [`ProxyBuilder`].
    pub fn with_catalog(catalog: Arc<Catalog>, config: RegistryConfig) -> Self {
        log::debug!(
            "registry '{}' created (aop by default: {}, max depth: {})",
            config.name,
            config.aop.enabled_by_default,
            config.resolution.max_depth
        );
        Self {
            proxies: ProxyBuilder::new(catalog.clone()),
            catalog,
            config,
            groups: RwLock::new(HashMap::new()),
            hooks: RwLock::new(Vec::new()),
        }
    }

    /// Add a type description to the catalog.
    pub fn describe(&self, info: TypeInfo) -> &Self {
        self.catalog.describe(info);
        self
    }

    /// The type catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The wrapper builder.
    pub fn proxies(&self) -> &ProxyBuilder {
        &self.proxies
    }

    /// The registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Run `hook` before every construction.
    pub fn add_hook<H: ResolveHook + 'static>(&self, hook: H) {
        self.hooks.write().push(Arc::new(hook));
    }

    /// The group registered for `service`, if any.
    pub fn group(&self, service: &TypeKey) -> Option<Arc<ServiceGroup>> {
        self.groups.read().get(service).cloned()
    }

    /// Every group, sorted by service name.
    pub fn groups(&self) -> Vec<Arc<ServiceGroup>> {
        let mut groups: Vec<Arc<ServiceGroup>> = self.groups.read().values().cloned().collect();
        groups.sort_by_key(|g| g.service().name());
        groups
    }

    /// Whether anything is registered for `service`.
    pub fn is_registered(&self, service: &TypeKey) -> bool {
        self.group(service).is_some_and(|g| !g.is_empty())
    }

    fn group_or_create(&self, service: &TypeKey) -> Arc<ServiceGroup> {
        if let Some(group) = self.groups.read().get(service) {
            return group.clone();
        }
        self.groups
            .write()
            .entry(service.clone())
            .or_insert_with(|| Arc::new(ServiceGroup::new(service.clone())))
            .clone()
    }

    fn insert(&self, service: &TypeKey, strategy: Strategy) -> Registration {
        let aop = self.config.aop.enabled_by_default && self.wrappable(service, &strategy);
        let group = self.group_or_create(service);
        let (entry, added) = group.insert(strategy, aop);
        if added {
            log::debug!("registered {service}: {entry}");
        }
        Registration::new(entry, added)
    }

    /// Whether resolutions of `strategy` as `service` can be wrapped with
    /// what the catalog currently describes. Gates the configured
    /// interception default; explicit `aop(true)` is not checked.
    fn wrappable(&self, service: &TypeKey, strategy: &Strategy) -> bool {
        let Some(info) = self.catalog.get(service) else {
            return false;
        };
        if info.capability::<Synthesizer>().is_none() {
            return false;
        }
        match strategy {
            Strategy::Implementation(implementation) => {
                !implementation.is_open_generic()
                    && self.proxies.supports_class_proxy(implementation)
            }
            _ if info.is_interface() => true,
            _ => self.proxies.supports_class_proxy(service),
        }
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Register a shared object as `S`.
    pub fn register_instance<S>(&self, instance: Arc<S>) -> Registration
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let instance = Instance::from_arc(instance);
        let service = instance.type_key().clone();
        self.insert(&service, Strategy::Instance(instance))
    }

    /// Register a shared object under a runtime service key.
    ///
    /// The object's type must be assignable to `service`.
    pub fn register_instance_as(&self, service: &TypeKey, instance: Instance) -> Result<Registration> {
        if !self.catalog.is_assignable(instance.type_key(), service) {
            return Err(Error::config(format!(
                "instance of {} cannot be registered as {service}",
                instance.type_key()
            )));
        }
        let view = self.catalog.cast(&instance, service)?;
        Ok(self.insert(service, Strategy::Instance(view)))
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// Register a factory producing `S`, called on every resolution.
    ///
    /// Registering the same fn item or non-capturing closure twice keeps a
    /// single entry; capturing closures are always new entries.
    pub fn register_factory<S, F>(&self, factory: F) -> Registration
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Registry) -> std::result::Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        let identity = factory_identity::<F>();
        let create = move |registry: &Registry| {
            factory(registry)
                .map(|value| Some(Instance::from_arc(value)))
                .map_err(Error::from_boxed)
        };
        self.insert(
            &TypeKey::of::<S>(),
            Strategy::Factory {
                create: Arc::new(create),
                identity,
            },
        )
    }

    /// Register an untyped factory under a runtime service key.
    ///
    /// The factory may return `None` to report a miss; any instance it
    /// returns is cast to `service` at resolution time.
    pub fn register_factory_as<F>(&self, service: &TypeKey, factory: F) -> Registration
    where
        F: Fn(&Registry) -> Result<Option<Instance>> + Send + Sync + 'static,
    {
        let identity = factory_identity::<F>();
        self.insert(
            service,
            Strategy::Factory {
                create: Arc::new(factory),
                identity,
            },
        )
    }

    // ========================================================================
    // Implementations
    // ========================================================================

    /// Register described type `T` as the implementation of `S`.
    pub fn register_type<S, T>(&self) -> Result<Registration>
    where
        S: ?Sized + 'static,
        T: ?Sized + 'static,
    {
        self.register_implementation(&TypeKey::of::<S>(), &TypeKey::of::<T>())
    }

    /// Register `implementation` for `service`.
    ///
    /// Fails when the implementation is not described, is not a public
    /// concrete class with a constructor, or does not implement `service`.
    pub fn register_implementation(
        &self,
        service: &TypeKey,
        implementation: &TypeKey,
    ) -> Result<Registration> {
        if implementation.is_open_generic() || service.is_open_generic() {
            return Err(Error::config(format!(
                "{service} -> {implementation}: open generic types are registered with register_generic"
            )));
        }
        let info = self.catalog.require(implementation)?;
        check_implementation(&info)?;
        if info.constructors().is_empty() {
            return Err(Error::config(format!(
                "{implementation} has no public constructor"
            )));
        }
        if !self.catalog.is_assignable(implementation, service) {
            return Err(Error::config(format!(
                "{implementation} does not implement {service}"
            )));
        }
        Ok(self.insert(service, Strategy::Implementation(implementation.clone())))
    }

    /// Register an open generic implementation for an open generic service.
    ///
    /// Closed instantiations of `service` that are not registered directly
    /// resolve through this entry, closing `implementation` with the same
    /// type arguments. The open definition of `implementation` must declare
    /// `service` among its interfaces.
    pub fn register_generic(
        &self,
        service: &TypeKey,
        implementation: &TypeKey,
    ) -> Result<Registration> {
        if !service.is_open_generic() || !implementation.is_open_generic() {
            return Err(Error::config(format!(
                "{service} -> {implementation}: both types must be open generic definitions"
            )));
        }
        if service.arity() != implementation.arity() {
            return Err(Error::config(format!(
                "{service} -> {implementation}: arity {} does not match {}",
                service.arity(),
                implementation.arity()
            )));
        }
        let info = self.catalog.require(implementation)?;
        check_implementation(&info)?;
        if !self.catalog.is_assignable(implementation, service) {
            return Err(Error::config(format!(
                "{implementation} does not declare {service}; describe it with implements_key"
            )));
        }
        Ok(self.insert(service, Strategy::Implementation(implementation.clone())))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("services", &self.groups.read().len())
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}

/// Dedup identity for factories: only zero-sized factory types (fn items,
/// non-capturing closures) are interchangeable.
fn factory_identity<F: 'static>() -> Option<TypeId> {
    (std::mem::size_of::<F>() == 0).then(TypeId::of::<F>)
}

fn check_implementation(info: &TypeInfo) -> Result<()> {
    let key = info.key();
    let rule = if info.is_interface() {
        Some("is an interface")
    } else if !info.is_public() {
        Some("is not public")
    } else if info.is_abstract() {
        Some("is abstract")
    } else if info.is_array() {
        Some("is an array type")
    } else {
        None
    };
    match rule {
        Some(rule) => Err(Error::config(format!("cannot register {key}: type {rule}"))),
        None => Ok(()),
    }
}
