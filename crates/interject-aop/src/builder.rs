//! The wrapper type builder.
//!
//! [`ProxyBuilder`] validates a target type once, works out which of its
//! methods are interceptable, binds its declarative aspects, and caches the
//! resulting [`WrapperDescriptor`] for the builder's lifetime. Lookups take
//! a shared lock; first-time builds take the exclusive lock and check the
//! cache again before building.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use interject_core::{Catalog, Error, Instance, MethodInfo, Result, TypeInfo, TypeKey};

use crate::binding::AspectBindings;
use crate::descriptor::{ProxyMode, Synthesizer, WrapperDescriptor};
use crate::interceptor::MethodFilter;

/// Builds and caches one [`WrapperDescriptor`] per target type.
pub struct ProxyBuilder {
    catalog: Arc<Catalog>,
    cache: RwLock<HashMap<TypeKey, Arc<WrapperDescriptor>>>,
}

impl ProxyBuilder {
    /// Builder over `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The catalog types are looked up in.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Descriptor for class-mode wrapping of `target`.
    ///
    /// Fails with a configuration error when the target is not a public,
    /// concrete, non-sealed, non-array, closed class with at least one
    /// public constructor. Failures are not cached.
    pub fn build_class_proxy(&self, target: &TypeKey) -> Result<Arc<WrapperDescriptor>> {
        self.get_or_build(target, ProxyMode::Class)
    }

    /// Descriptor for interface-mode wrapping of `interface`.
    pub fn build_interface_proxy(&self, interface: &TypeKey) -> Result<Arc<WrapperDescriptor>> {
        self.get_or_build(interface, ProxyMode::Interface)
    }

    /// Whether `target` passes the class-mode rules, without building or
    /// caching a descriptor.
    pub fn supports_class_proxy(&self, target: &TypeKey) -> bool {
        self.catalog
            .get(target)
            .is_some_and(|info| validate_class(&info).is_ok())
    }

    /// Cached descriptor, without building.
    pub fn cached(&self, target: &TypeKey) -> Option<Arc<WrapperDescriptor>> {
        self.cache.read().get(target).cloned()
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether no descriptor has been built.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Resolve aspect-type markers into factories.
    pub fn bindings(&self, markers: &[TypeKey]) -> AspectBindings {
        AspectBindings::resolve(&self.catalog, markers)
    }

    /// Hand out `target` wrapped as `service`.
    ///
    /// Interface-mode descriptors wrap with their own synthesizer. A
    /// class-mode target is viewed as `service` and wrapped with the
    /// synthesizer of that contract, intercepting only the class's
    /// interceptable methods.
    pub fn wrap_as(
        &self,
        descriptor: &WrapperDescriptor,
        target: &Instance,
        service: &TypeKey,
        dynamic: &AspectBindings,
    ) -> Result<Instance> {
        match descriptor.mode() {
            ProxyMode::Interface => {
                let view = self.catalog.cast(target, descriptor.target())?;
                descriptor.wrap(view, dynamic)
            }
            ProxyMode::Class => {
                let view = self.catalog.cast(target, service)?;
                if service == descriptor.target() {
                    return descriptor.wrap(view, dynamic);
                }
                let info = self.catalog.require(service)?;
                let synthesizer = info.capability::<Synthesizer>().ok_or_else(|| {
                    Error::config(format!("{service} has no proxy to wrap instances with"))
                })?;
                descriptor.wrap_with(synthesizer, view, dynamic)
            }
        }
    }

    fn get_or_build(&self, key: &TypeKey, mode: ProxyMode) -> Result<Arc<WrapperDescriptor>> {
        if let Some(descriptor) = self.cache.read().get(key) {
            return check_mode(descriptor, mode);
        }

        let mut cache = self.cache.write();
        if let Some(descriptor) = cache.get(key) {
            return check_mode(descriptor, mode);
        }

        let info = self.catalog.require(key)?;
        let descriptor = Arc::new(match mode {
            ProxyMode::Class => self.describe_class(&info)?,
            ProxyMode::Interface => self.describe_interface(&info)?,
        });
        log::debug!(
            "built {mode} proxy for {key}: {} interceptable method(s), {} static aspect(s)",
            descriptor.interceptable_methods().len(),
            descriptor.static_aspects().len()
        );
        cache.insert(key.clone(), descriptor.clone());
        Ok(descriptor)
    }

    fn describe_class(&self, info: &TypeInfo) -> Result<WrapperDescriptor> {
        validate_class(info)?;

        let interfaces: Vec<Arc<TypeInfo>> = self
            .catalog
            .interfaces_of(info.key())
            .iter()
            .filter_map(|iface| self.catalog.get(iface))
            .collect();
        // Methods a generated interface proxy forwards count as declared.
        let interface_methods: Vec<MethodInfo> = interfaces
            .iter()
            .flat_map(|iface| {
                let proxied = iface
                    .capability::<Synthesizer>()
                    .map(|s| s.methods().to_vec())
                    .unwrap_or_default();
                iface
                    .methods()
                    .iter()
                    .cloned()
                    .chain(proxied.into_iter().map(MethodInfo::named))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut methods = Vec::new();
        let mut seen = HashSet::new();
        for method in info.methods() {
            let matches_interface = interface_methods.iter().any(|m| m.matches(method));
            if (method.is_overridable() || matches_interface) && seen.insert(method.name()) {
                methods.push(method.name().to_string());
            }
        }
        // Every interface method exists on an implementing class.
        for method in &interface_methods {
            if seen.insert(method.name()) {
                methods.push(method.name().to_string());
            }
        }

        Ok(WrapperDescriptor {
            target: info.key().clone(),
            mode: ProxyMode::Class,
            constructors: info.constructors().to_vec(),
            filter: MethodFilter::Only(methods.iter().cloned().collect()),
            methods,
            static_aspects: self.bindings(info.aspect_markers()),
            synthesizer: info.capability::<Synthesizer>().cloned(),
        })
    }

    fn describe_interface(&self, info: &TypeInfo) -> Result<WrapperDescriptor> {
        if !info.is_interface() {
            return Err(Error::config(format!("{} is not an interface", info.key())));
        }
        let synthesizer = info.capability::<Synthesizer>().cloned().ok_or_else(|| {
            Error::config(format!(
                "interface {} has no proxy; describe it with `proxied_by`",
                info.key()
            ))
        })?;

        let mut methods: Vec<String> = info.methods().iter().map(|m| m.name().to_string()).collect();
        for name in synthesizer.methods() {
            if !methods.contains(name) {
                methods.push(name.clone());
            }
        }

        Ok(WrapperDescriptor {
            target: info.key().clone(),
            mode: ProxyMode::Interface,
            constructors: Vec::new(),
            filter: MethodFilter::All,
            methods,
            static_aspects: self.bindings(info.aspect_markers()),
            synthesizer: Some(synthesizer),
        })
    }
}

impl std::fmt::Debug for ProxyBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyBuilder")
            .field("catalog", &self.catalog)
            .field("cached", &self.len())
            .finish()
    }
}

fn check_mode(descriptor: &Arc<WrapperDescriptor>, mode: ProxyMode) -> Result<Arc<WrapperDescriptor>> {
    if descriptor.mode() == mode {
        Ok(descriptor.clone())
    } else {
        Err(Error::config(format!(
            "{} is wrapped in {} mode, not {mode} mode",
            descriptor.target(),
            descriptor.mode()
        )))
    }
}

/// Class-mode rules, checked in order; the first violation is reported.
fn validate_class(info: &TypeInfo) -> Result<()> {
    let key = info.key();
    let violation = if info.is_interface() {
        Some("is an interface, not a class")
    } else if !info.is_public() {
        Some("is not public")
    } else if info.is_open_generic() {
        Some("is an open generic definition")
    } else if info.is_abstract() {
        Some("is abstract")
    } else if info.is_sealed() {
        Some("is sealed")
    } else if info.is_array() {
        Some("is an array type")
    } else if info.constructors().is_empty() {
        Some("has no public constructor")
    } else {
        None
    };
    match violation {
        Some(rule) => Err(Error::config(format!("cannot wrap {key}: type {rule}"))),
        None => Ok(()),
    }
}
