//! Resolution: selecting an entry and turning it into an instance.
//!
//! A miss (nothing registered, no matching name or key, no usable
//! constructor) is `Ok(None)`. Errors are reserved for configuration
//! problems found late (e.g. a wrapper that cannot be built), exceeded
//! depth, and failures raised by constructors and factories, which come
//! back unchanged.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use interject_aop::WrapperDescriptor;
use interject_core::{ConstructorInfo, Error, Instance, Result, TypeKey};

use crate::entry::{RegistrationEntry, Strategy};
use crate::group::Selector;
use crate::hook::ResolveRequest;
use crate::key::ServiceKey;
use crate::registry::Registry;

/// Explicit constructor arguments; `None` passes a null.
pub type Args = [Option<Instance>];

impl Registry {
    // ========================================================================
    // Typed lookups
    // ========================================================================

    /// Resolve the most recently registered `S`.
    pub fn get<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>> {
        self.get_as(&TypeKey::of::<S>())
    }

    /// Resolve `S` with explicit constructor arguments.
    pub fn get_with_args<S: ?Sized + Send + Sync + 'static>(
        &self,
        args: &Args,
    ) -> Result<Option<Arc<S>>> {
        typed(self.resolve_with_args(&TypeKey::of::<S>(), args)?)
    }

    /// Resolve the `S` registered under `name`.
    pub fn get_by_name<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<S>>> {
        typed(self.resolve_named(&TypeKey::of::<S>(), name)?)
    }

    /// Resolve the `S` registered under `key`.
    pub fn get_by_key<S, K>(&self, key: K) -> Result<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
        K: Any + Send + Sync + fmt::Debug + Eq + Hash,
    {
        typed(self.resolve_keyed(&TypeKey::of::<S>(), &ServiceKey::new(key))?)
    }

    /// Resolve the `S` registered under `name` with explicit constructor
    /// arguments.
    pub fn get_by_name_with_args<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        args: &Args,
    ) -> Result<Option<Arc<S>>> {
        typed(self.resolve_named_with_args(&TypeKey::of::<S>(), name, args)?)
    }

    /// Resolve the `S` registered under `key` with explicit constructor
    /// arguments.
    pub fn get_by_key_with_args<S, K>(&self, key: K, args: &Args) -> Result<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
        K: Any + Send + Sync + fmt::Debug + Eq + Hash,
    {
        typed(self.resolve_keyed_with_args(&TypeKey::of::<S>(), &ServiceKey::new(key), args)?)
    }

    /// Resolve a runtime service key and view the result as `S`.
    ///
    /// Used for closed generic services, whose key is structural.
    pub fn get_as<S: ?Sized + Send + Sync + 'static>(
        &self,
        service: &TypeKey,
    ) -> Result<Option<Arc<S>>> {
        typed(self.resolve(service)?)
    }

    /// Resolve every entry registered for `S`, in registration order.
    pub fn get_all<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<S>>> {
        self.resolve_all(&TypeKey::of::<S>())?
            .iter()
            .map(Instance::try_downcast::<S>)
            .collect()
    }

    // ========================================================================
    // Untyped lookups
    // ========================================================================

    /// Resolve the default entry for `service`.
    pub fn resolve(&self, service: &TypeKey) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Default, None, 0)
    }

    /// Resolve the entry named `name`.
    pub fn resolve_named(&self, service: &TypeKey, name: &str) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Name(name.to_string()), None, 0)
    }

    /// Resolve the entry keyed `key`.
    pub fn resolve_keyed(&self, service: &TypeKey, key: &ServiceKey) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Key(key.clone()), None, 0)
    }

    /// Resolve the default entry with explicit constructor arguments.
    pub fn resolve_with_args(&self, service: &TypeKey, args: &Args) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Default, Some(args), 0)
    }

    /// Resolve the entry named `name` with explicit constructor arguments.
    pub fn resolve_named_with_args(
        &self,
        service: &TypeKey,
        name: &str,
        args: &Args,
    ) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Name(name.to_string()), Some(args), 0)
    }

    /// Resolve the entry keyed `key` with explicit constructor arguments.
    pub fn resolve_keyed_with_args(
        &self,
        service: &TypeKey,
        key: &ServiceKey,
        args: &Args,
    ) -> Result<Option<Instance>> {
        self.resolve_at(service, &Selector::Key(key.clone()), Some(args), 0)
    }

    /// Resolve every directly registered entry for `service`. Misses are
    /// skipped.
    pub fn resolve_all(&self, service: &TypeKey) -> Result<Vec<Instance>> {
        let Some(group) = self.group(service) else {
            return Ok(Vec::new());
        };
        let mut resolved = Vec::new();
        for entry in group.entries() {
            if let Some(instance) = self.create(service, &entry, None, None, 0)? {
                resolved.push(instance);
            }
        }
        Ok(resolved)
    }

    /// Whether `service` could be resolved without explicit arguments.
    ///
    /// Side-effect free: nothing is constructed and no hook runs.
    pub fn can_resolve(&self, service: &TypeKey) -> bool {
        self.feasible(service, &mut HashSet::new())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub(crate) fn resolve_at(
        &self,
        service: &TypeKey,
        selector: &Selector,
        args: Option<&Args>,
        depth: usize,
    ) -> Result<Option<Instance>> {
        let max_depth = self.config.resolution.max_depth;
        if depth > max_depth {
            log::warn!("resolution of {service} exceeded depth {max_depth}");
            return Err(Error::DepthExceeded {
                service: service.to_string(),
                depth: max_depth,
            });
        }
        self.trace(depth, format_args!("resolve {service} ({selector:?})"));

        if let Some(group) = self.group(service) {
            return match group.select(selector) {
                Some(entry) => self.create(service, &entry, None, args, depth),
                None => {
                    self.trace(depth, format_args!("no {selector:?} entry for {service}"));
                    Ok(None)
                }
            };
        }

        let Some((entry, closed)) = self.open_generic_entry(service, selector) else {
            self.trace(depth, format_args!("{service} is not registered"));
            return Ok(None);
        };
        self.create(service, &entry, Some(&closed), args, depth)
    }

    /// Entry of the open definition of `service`, with the implementation
    /// closed over `service`'s type arguments.
    fn open_generic_entry(
        &self,
        service: &TypeKey,
        selector: &Selector,
    ) -> Option<(Arc<RegistrationEntry>, TypeKey)> {
        let definition = service.generic_definition()?;
        let entry = self.group(definition)?.select(selector)?;
        let Strategy::Implementation(open) = entry.strategy() else {
            return None;
        };
        let closed = open.close(service.generic_args())?;
        // An instantiation the closer does not describe is a miss.
        self.catalog.get(&closed)?;
        log::trace!("{service} falls back to {definition}, implemented by {closed}");
        Some((entry, closed))
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Produce an instance from `entry`. `closed` overrides the
    /// implementation of an open generic entry.
    fn create(
        &self,
        service: &TypeKey,
        entry: &RegistrationEntry,
        closed: Option<&TypeKey>,
        args: Option<&Args>,
        depth: usize,
    ) -> Result<Option<Instance>> {
        let hooks = self.hooks.read().clone();
        if !hooks.is_empty() {
            let request = ResolveRequest {
                service,
                entry,
                args,
            };
            for hook in &hooks {
                if let Some(substitute) = hook.before_create(self, &request) {
                    self.trace(depth, format_args!("hook substituted {service}"));
                    return self.catalog.cast(&substitute, service).map(Some);
                }
            }
        }

        match entry.strategy() {
            Strategy::Instance(instance) => self.finish(service, entry, instance).map(Some),
            Strategy::Factory { create, .. } => match create(self)? {
                Some(instance) => self.finish(service, entry, &instance).map(Some),
                None => Ok(None),
            },
            Strategy::Implementation(implementation) => {
                let implementation = closed.unwrap_or(implementation);
                self.construct(service, entry, implementation, args, depth)
            }
        }
    }

    /// View a fetched instance as `service`, wrapping it if interception
    /// is on.
    fn finish(
        &self,
        service: &TypeKey,
        entry: &RegistrationEntry,
        instance: &Instance,
    ) -> Result<Instance> {
        if !entry.is_aop() {
            return self.catalog.cast(instance, service);
        }
        let info = self.catalog.require(service)?;
        let descriptor = if info.is_interface() {
            self.proxies.build_interface_proxy(service)?
        } else {
            self.proxies.build_class_proxy(service)?
        };
        self.wrap(&descriptor, service, entry, instance)
    }

    fn wrap(
        &self,
        descriptor: &WrapperDescriptor,
        service: &TypeKey,
        entry: &RegistrationEntry,
        instance: &Instance,
    ) -> Result<Instance> {
        let dynamic = self.proxies.bindings(&entry.aspects());
        self.proxies
            .wrap_as(descriptor, instance, service, &dynamic)
    }

    fn construct(
        &self,
        service: &TypeKey,
        entry: &RegistrationEntry,
        implementation: &TypeKey,
        args: Option<&Args>,
        depth: usize,
    ) -> Result<Option<Instance>> {
        let info = self.catalog.require(implementation)?;

        // Class-mode entries construct through the wrapper's forwarded
        // constructors.
        let descriptor = if entry.is_aop() {
            Some(self.proxies.build_class_proxy(implementation)?)
        } else {
            None
        };
        let constructors = match &descriptor {
            Some(descriptor) => descriptor.constructors(),
            None => info.constructors(),
        };

        // An empty argument list supplies nothing.
        let chosen = match args.filter(|args| !args.is_empty()) {
            Some(args) => self.match_args(constructors, args)?,
            None => match self.first_feasible(constructors) {
                Some(index) => self
                    .resolve_params(&constructors[index], depth)?
                    .map(|values| (index, values)),
                None => None,
            },
        };
        let Some((index, values)) = chosen else {
            self.trace(
                depth,
                format_args!("no usable constructor on {implementation} for {service}"),
            );
            return Ok(None);
        };

        let instance = constructors[index].invoke(values)?;
        match &descriptor {
            Some(descriptor) => self.wrap(descriptor, service, entry, &instance).map(Some),
            None => self.catalog.cast(&instance, service).map(Some),
        }
    }

    /// First constructor compatible with explicit `args`, with the values
    /// cast to the parameter types.
    fn match_args(
        &self,
        constructors: &[ConstructorInfo],
        args: &Args,
    ) -> Result<Option<(usize, Vec<Option<Instance>>)>> {
        'constructors: for (index, constructor) in constructors.iter().enumerate() {
            if constructor.arity() != args.len() {
                continue;
            }
            let mut values = Vec::with_capacity(args.len());
            for (param, arg) in constructor.params().iter().zip(args) {
                match arg {
                    None if param.is_nullable() => values.push(None),
                    None => continue 'constructors,
                    Some(value) => match self.catalog.cast(value, param.ty()) {
                        Ok(view) => values.push(Some(view)),
                        Err(_) => continue 'constructors,
                    },
                }
            }
            return Ok(Some((index, values)));
        }
        Ok(None)
    }

    fn first_feasible(&self, constructors: &[ConstructorInfo]) -> Option<usize> {
        constructors.iter().position(|constructor| {
            constructor
                .params()
                .iter()
                .all(|param| param.is_nullable() || self.can_resolve(param.ty()))
        })
    }

    /// Resolve each parameter one level deeper. A required parameter that
    /// misses makes the whole constructor a miss.
    fn resolve_params(
        &self,
        constructor: &ConstructorInfo,
        depth: usize,
    ) -> Result<Option<Vec<Option<Instance>>>> {
        let mut values = Vec::with_capacity(constructor.arity());
        for param in constructor.params() {
            let value = self.resolve_at(param.ty(), &Selector::Default, None, depth + 1)?;
            if value.is_none() && !param.is_nullable() {
                return Ok(None);
            }
            values.push(value);
        }
        Ok(Some(values))
    }

    // ========================================================================
    // Feasibility
    // ========================================================================

    fn feasible(&self, service: &TypeKey, visiting: &mut HashSet<TypeKey>) -> bool {
        if !visiting.insert(service.clone()) {
            return false;
        }
        let feasible = match self.group(service) {
            Some(group) => match group.default_entry() {
                Some(entry) => self.entry_feasible(entry.strategy(), None, visiting),
                None => false,
            },
            None => match self.open_generic_entry(service, &Selector::Default) {
                Some((entry, closed)) => {
                    self.entry_feasible(entry.strategy(), Some(&closed), visiting)
                }
                None => false,
            },
        };
        visiting.remove(service);
        feasible
    }

    fn entry_feasible(
        &self,
        strategy: &Strategy,
        closed: Option<&TypeKey>,
        visiting: &mut HashSet<TypeKey>,
    ) -> bool {
        let Strategy::Implementation(implementation) = strategy else {
            return true;
        };
        let implementation = closed.unwrap_or(implementation);
        let Some(info) = self.catalog.get(implementation) else {
            return false;
        };
        info.constructors().iter().any(|constructor| {
            constructor
                .params()
                .iter()
                .all(|param| param.is_nullable() || self.feasible(param.ty(), visiting))
        })
    }

    fn trace(&self, depth: usize, message: fmt::Arguments<'_>) {
        if self.config.resolution.trace {
            log::debug!("[{}:{depth}] {message}", self.config.name);
        } else {
            log::trace!("[{}:{depth}] {message}", self.config.name);
        }
    }
}

fn typed<S: ?Sized + Send + Sync + 'static>(instance: Option<Instance>) -> Result<Option<Arc<S>>> {
    instance.map(|i| i.try_downcast::<S>()).transpose()
}
