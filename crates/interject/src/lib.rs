//! Interject — runtime interception and dependency resolution.
//!
//! Umbrella crate re-exporting the Interject components:
//!
//! - [`core`]: errors, type keys, instances, the type catalog, config
//! - [`aop`]: aspects, the interception pipeline, wrapper builder
//! - [`di`]: the service registry and resolver (feature `di`, default)
//!
//! Most programs only need the [`prelude`].

#![doc = include_str!("../README.md")]

pub use interject_aop as aop;
pub use interject_core as core;
#[cfg(feature = "di")]
pub use interject_di as di;

pub use interject_aop::interface_proxy;
pub use interject_core::{Error, Result};

/// The types needed to describe, register, resolve and intercept.
///
/// `Result` is left out so glob imports keep `std`'s two-parameter one.
pub mod prelude {
    pub use interject_aop::{
        describe_aspect, interface_proxy, Argument, Aspect, AspectFactory, Disposable,
        InterceptionContext, Interceptor, LoggingAspect, ProxiedBy, ProxyBuilder,
        WrapperDescriptor,
    };
    pub use interject_core::{
        BoxError, Catalog, Error, Instance, MethodInfo, ParamInfo, RegistryConfig, TypeInfo,
        TypeKey,
    };
    #[cfg(feature = "di")]
    pub use interject_di::{Registration, Registry, ResolveHook, ResolveRequest, ServiceKey};
}
