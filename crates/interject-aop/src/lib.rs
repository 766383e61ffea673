//! Interject AOP — aspects, the interception pipeline, and wrappers.
//!
//! This crate turns described types into intercepting wrappers. It depends
//! on `interject-core` only (dependency level 1).
//!
//! # Modules
//!
//! - [`aspect`]: The aspect contract and aspect factories
//! - [`context`]: The per-call interception record
//! - [`binding`]: Resolving aspect markers into factories
//! - [`interceptor`]: The per-call pipeline
//! - [`descriptor`]: Wrapper descriptors and synthesizers
//! - [`builder`]: The cached wrapper type builder
//! - [`logging`]: A stock logging aspect

#![doc = include_str!("../README.md")]

pub mod aspect;
pub mod binding;
pub mod builder;
pub mod context;
pub mod descriptor;
pub mod interceptor;
pub mod logging;
mod macros;

// Re-export key types at crate root for convenience
pub use aspect::{
    describe_aspect, Aspect, AspectConstructor, AspectFactory, Disposable, FnAspectFactory,
};
pub use binding::AspectBindings;
pub use builder::ProxyBuilder;
pub use context::{Argument, InterceptionContext};
pub use descriptor::{InterfaceProxy, ProxiedBy, ProxyMode, Synthesizer, WrapperDescriptor};
pub use interceptor::{Interceptor, MethodFilter};
pub use logging::LoggingAspect;
