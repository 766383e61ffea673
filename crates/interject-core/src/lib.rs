//! Interject Core — errors, runtime type identity, type metadata, config.
//!
//! This crate provides the foundational types used across all Interject
//! crates. It has no internal Interject dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Structural runtime type keys
//! - [`instance`]: Type-erased shared object handles
//! - [`metadata`]: Type descriptions and the catalog that stores them
//! - [`config`]: Registry configuration loading

#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod instance;
pub mod metadata;
pub mod types;

// Re-export key types at crate root for convenience
pub use config::RegistryConfig;
pub use error::{BoxError, Error, Result};
pub use instance::Instance;
pub use metadata::{
    Catalog, ConstructorArgs, ConstructorInfo, InterfaceImpl, MethodInfo, ParamInfo, TypeInfo,
    TypeInfoBuilder, TypeKind,
};
pub use types::TypeKey;
