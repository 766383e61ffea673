//! Interject DI — the service registry and recursive resolver.
//!
//! Depends on `interject-core` and `interject-aop` (dependency level 2).
//!
//! # Modules
//!
//! - [`registry`]: Registration under service types
//! - [`resolver`]: Entry selection, construction and wrapping
//! - [`entry`]: Registration entries and creation strategies
//! - [`group`]: Per-service entry groups and selectors
//! - [`handle`]: The fluent registration handle
//! - [`hook`]: Pre-construction hooks
//! - [`key`]: Arbitrary registration keys
//! - [`scan`]: Bulk registration over candidate types

#![doc = include_str!("../README.md")]

pub mod entry;
mod global;
pub mod group;
pub mod handle;
pub mod hook;
pub mod key;
pub mod registry;
pub mod resolver;
pub mod scan;

// Re-export key types at crate root for convenience
pub use entry::{FactoryFn, RegistrationEntry, Strategy};
pub use group::{Selector, ServiceGroup};
pub use handle::Registration;
pub use hook::{ResolveHook, ResolveRequest};
pub use key::ServiceKey;
pub use registry::Registry;
pub use resolver::Args;
