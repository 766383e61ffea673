//! Runtime type identity.
//!
//! [`TypeKey`] names a type at runtime. Plain Rust types (including trait
//! objects such as `dyn Greeter`) are keyed by their `TypeId`; generic types
//! are keyed structurally so that an unregistered closed type such as
//! `Repository<User>` can be traced back to its open definition
//! `Repository<_>` and re-closed with other arguments.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Structural identity of a runtime type.
///
/// Cloning is cheap (Arc clone).
#[derive(Clone)]
pub struct TypeKey(Arc<Repr>);

#[derive(PartialEq, Eq, Hash)]
enum Repr {
    Concrete { id: TypeId, name: &'static str },
    Open { name: String, arity: usize },
    Closed { definition: TypeKey, args: Vec<TypeKey> },
}

impl TypeKey {
    /// Key for a Rust type. Works for unsized types such as `dyn Trait`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::new(Repr::Concrete {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }))
    }

    /// Key for an open generic definition with `arity` type parameters.
    pub fn open(name: impl Into<String>, arity: usize) -> Self {
        Self(Arc::new(Repr::Open {
            name: name.into(),
            arity,
        }))
    }

    /// Key for `definition` closed over `args`.
    ///
    /// `definition` should be an open key with a matching arity; use
    /// [`TypeKey::close`] for a checked variant.
    pub fn closed(definition: &TypeKey, args: Vec<TypeKey>) -> Self {
        Self(Arc::new(Repr::Closed {
            definition: definition.clone(),
            args,
        }))
    }

    /// Close this open definition over `args`, checking arity.
    pub fn close(&self, args: &[TypeKey]) -> Option<TypeKey> {
        match &*self.0 {
            Repr::Open { arity, .. } if *arity == args.len() => {
                Some(Self::closed(self, args.to_vec()))
            }
            _ => None,
        }
    }

    /// The Rust `TypeId`, for keys created with [`TypeKey::of`].
    pub fn type_id(&self) -> Option<TypeId> {
        match &*self.0 {
            Repr::Concrete { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Whether this is an open generic definition.
    pub fn is_open_generic(&self) -> bool {
        matches!(&*self.0, Repr::Open { .. })
    }

    /// Whether this is a closed generic type.
    pub fn is_closed_generic(&self) -> bool {
        matches!(&*self.0, Repr::Closed { .. })
    }

    /// Number of type parameters of an open definition (0 otherwise).
    pub fn arity(&self) -> usize {
        match &*self.0 {
            Repr::Open { arity, .. } => *arity,
            _ => 0,
        }
    }

    /// The open definition of a closed generic type.
    pub fn generic_definition(&self) -> Option<&TypeKey> {
        match &*self.0 {
            Repr::Closed { definition, .. } => Some(definition),
            _ => None,
        }
    }

    /// Type arguments of a closed generic type (empty otherwise).
    pub fn generic_args(&self) -> &[TypeKey] {
        match &*self.0 {
            Repr::Closed { args, .. } => args,
            _ => &[],
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Repr::Concrete { name, .. } => write!(f, "{name}"),
            Repr::Open { name, arity } => {
                let params = vec!["_"; *arity].join(", ");
                write!(f, "{name}<{params}>")
            }
            Repr::Closed { definition, args } => {
                let base = match &*definition.0 {
                    Repr::Open { name, .. } => name.clone(),
                    _ => definition.to_string(),
                };
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{base}<{}>", args.join(", "))
            }
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Shape {}
    struct Square;

    #[test]
    fn test_type_key_of_identity() {
        assert_eq!(TypeKey::of::<Square>(), TypeKey::of::<Square>());
        assert_ne!(TypeKey::of::<Square>(), TypeKey::of::<dyn Shape>());
        assert_eq!(
            TypeKey::of::<Square>().type_id(),
            Some(TypeId::of::<Square>())
        );
    }

    #[test]
    fn test_type_key_trait_object() {
        let key = TypeKey::of::<dyn Shape>();
        assert!(key.name().contains("Shape"));
        assert!(!key.is_open_generic());
    }

    #[test]
    fn test_open_and_closed_keys() {
        let open = TypeKey::open("Repository", 1);
        assert!(open.is_open_generic());
        assert_eq!(open.arity(), 1);
        assert_eq!(open.to_string(), "Repository<_>");

        let closed = open.close(&[TypeKey::of::<u32>()]).unwrap();
        assert!(closed.is_closed_generic());
        assert_eq!(closed.generic_definition(), Some(&open));
        assert_eq!(closed.generic_args(), &[TypeKey::of::<u32>()]);
        assert_eq!(closed.to_string(), "Repository<u32>");
    }

    #[test]
    fn test_close_checks_arity() {
        let open = TypeKey::open("Pair", 2);
        assert!(open.close(&[TypeKey::of::<u8>()]).is_none());
        assert!(TypeKey::of::<u8>().close(&[]).is_none());
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = TypeKey::closed(&TypeKey::open("Box", 1), vec![TypeKey::of::<i64>()]);
        let b = TypeKey::closed(&TypeKey::open("Box", 1), vec![TypeKey::of::<i64>()]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
