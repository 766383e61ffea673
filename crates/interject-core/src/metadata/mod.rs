//! Runtime type metadata.
//!
//! Rust has no runtime reflection, so types that take part in wrapping or
//! registration are described once through [`TypeInfo`] builders and
//! stored in a [`Catalog`].

mod catalog;
mod constructor;
mod type_info;

pub use catalog::Catalog;
pub use constructor::{ConstructorArgs, ConstructorInfo, ParamInfo};
pub use type_info::{
    GenericDefinition, InterfaceImpl, MethodInfo, Signature, TypeInfo, TypeInfoBuilder, TypeKind,
};
