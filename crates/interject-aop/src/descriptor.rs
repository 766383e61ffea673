//! Wrapper descriptors and the synthesizers that instantiate them.

use std::fmt;
use std::sync::Arc;

use interject_core::{ConstructorInfo, Error, Instance, Result, TypeInfoBuilder, TypeKey};

use crate::aspect::AspectFactory;
use crate::binding::AspectBindings;
use crate::interceptor::{Interceptor, MethodFilter};

// ============================================================================
// Synthesis
// ============================================================================

/// A composition wrapper generated for one interface.
///
/// Implemented by the structs [`interface_proxy!`](crate::interface_proxy)
/// generates. The wrapper holds the real target and forwards every method
/// through its [`Interceptor`].
pub trait InterfaceProxy: Send + Sync + 'static {
    /// The wrapped contract, usually `dyn Trait`.
    type Interface: ?Sized + Send + Sync + 'static;

    /// Names of the interface methods, in declaration order.
    const METHODS: &'static [&'static str];

    /// Wrap `target`, handing back the wrapper as the contract.
    fn wrap(target: Arc<Self::Interface>, interceptor: Arc<Interceptor>) -> Arc<Self::Interface>;
}

type SynthesizeFn = dyn Fn(Instance, Arc<Interceptor>) -> Result<Instance> + Send + Sync;

/// Produces wrapper instances for one type. Stored as a capability on the
/// type's `TypeInfo`.
#[derive(Clone)]
pub struct Synthesizer {
    methods: Vec<String>,
    synthesize: Arc<SynthesizeFn>,
}

impl Synthesizer {
    /// Synthesizer from a closure. `methods` lists what the wrapper can
    /// intercept.
    pub fn new<F>(methods: Vec<String>, synthesize: F) -> Self
    where
        F: Fn(Instance, Arc<Interceptor>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            methods,
            synthesize: Arc::new(synthesize),
        }
    }

    /// Synthesizer for a generated proxy type.
    pub fn of<P: InterfaceProxy>() -> Self {
        let methods = P::METHODS.iter().map(|m| (*m).to_string()).collect();
        Self::new(methods, |target, interceptor| {
            let inner = target.try_downcast::<P::Interface>()?;
            Ok(Instance::with_key(
                target.type_key().clone(),
                P::wrap(inner, interceptor),
            ))
        })
    }

    /// Methods the wrapper forwards.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Wrap `target`.
    pub fn synthesize(&self, target: Instance, interceptor: Arc<Interceptor>) -> Result<Instance> {
        (self.synthesize)(target, interceptor)
    }
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer")
            .field("methods", &self.methods)
            .finish()
    }
}

/// Attach a generated proxy to a type description.
pub trait ProxiedBy: Sized {
    /// Use `P` to wrap instances of the described interface.
    fn proxied_by<P: InterfaceProxy>(self) -> Self;
}

impl<T: ?Sized> ProxiedBy for TypeInfoBuilder<T> {
    fn proxied_by<P: InterfaceProxy>(self) -> Self {
        self.capability(Synthesizer::of::<P>())
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// How a wrapper reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProxyMode {
    /// Built through the target class's own constructors; only overridable
    /// and interface-matching methods are intercepted.
    Class,
    /// Wraps an existing object implementing the interface; every method
    /// is intercepted.
    Interface,
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Interface => write!(f, "interface"),
        }
    }
}

/// The cached wrapper for one target type.
pub struct WrapperDescriptor {
    pub(crate) target: TypeKey,
    pub(crate) mode: ProxyMode,
    pub(crate) constructors: Vec<ConstructorInfo>,
    pub(crate) filter: MethodFilter,
    pub(crate) methods: Vec<String>,
    pub(crate) static_aspects: AspectBindings,
    pub(crate) synthesizer: Option<Synthesizer>,
}

impl WrapperDescriptor {
    /// The wrapped type.
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    /// Class or interface mode.
    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    /// Forwarded constructors (class mode), 1:1 with the target's.
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Interceptable method names.
    pub fn interceptable_methods(&self) -> &[String] {
        &self.methods
    }

    /// Whether calls to `method` run the pipeline.
    pub fn is_interceptable(&self, method: &str) -> bool {
        self.filter.allows(method)
    }

    /// Type-level aspect factories.
    pub fn static_aspects(&self) -> &[Arc<dyn AspectFactory>] {
        self.static_aspects.factories()
    }

    /// The type's own synthesizer, if it has one.
    pub fn synthesizer(&self) -> Option<&Synthesizer> {
        self.synthesizer.as_ref()
    }

    /// Interceptor with static factories followed by `dynamic` ones.
    pub fn interceptor(&self, dynamic: &AspectBindings) -> Arc<Interceptor> {
        Arc::new(Interceptor::new(
            self.target.clone(),
            self.filter.clone(),
            self.static_aspects.chain(dynamic),
        ))
    }

    /// Wrap `target` with the type's own synthesizer.
    pub fn wrap(&self, target: Instance, dynamic: &AspectBindings) -> Result<Instance> {
        let synthesizer = self.synthesizer.as_ref().ok_or_else(|| {
            Error::config(format!("{} has no proxy to wrap instances with", self.target))
        })?;
        self.wrap_with(synthesizer, target, dynamic)
    }

    /// Wrap `target` with an explicit synthesizer, e.g. the one of an
    /// interface a class-mode target is handed out as.
    pub fn wrap_with(
        &self,
        synthesizer: &Synthesizer,
        target: Instance,
        dynamic: &AspectBindings,
    ) -> Result<Instance> {
        synthesizer.synthesize(target, self.interceptor(dynamic))
    }

    /// Construct a raw target through forwarded constructor `index`.
    pub fn instantiate(&self, index: usize, values: Vec<Option<Instance>>) -> Result<Instance> {
        let constructor = self.constructors.get(index).ok_or_else(|| {
            Error::config(format!("{} has no constructor #{index}", self.target))
        })?;
        constructor.invoke(values)
    }
}

impl fmt::Debug for WrapperDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aspects = self.static_aspects.aspect_types();
        f.debug_struct("WrapperDescriptor")
            .field("target", &self.target)
            .field("mode", &self.mode)
            .field("constructors", &self.constructors.len())
            .field("methods", &self.methods)
            .field("static_aspects", &aspects)
            .field("synthesizer", &self.synthesizer.is_some())
            .finish()
    }
}
