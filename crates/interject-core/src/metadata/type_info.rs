//! Type descriptions and their builder.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::constructor::{ConstructorArgs, ConstructorInfo, ParamInfo};
use crate::instance::Instance;
use crate::types::TypeKey;
use crate::BoxError;

/// Whether a type is a class (constructible, holds state) or an interface
/// (a contract, realised in Rust as a trait object).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Concrete or abstract class.
    Class,
    /// Interface (trait object).
    Interface,
}

/// Parameter and return types of a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Parameter types, excluding the receiver.
    pub params: Vec<TypeKey>,
    /// Return type.
    pub returns: TypeKey,
}

/// A public instance method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    name: String,
    signature: Option<Signature>,
    overridable: bool,
}

impl MethodInfo {
    /// A method known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: None,
            overridable: false,
        }
    }

    /// Attach parameter and return types.
    pub fn signature(mut self, params: Vec<TypeKey>, returns: TypeKey) -> Self {
        self.signature = Some(Signature { params, returns });
        self
    }

    /// Mark the method as overridable (virtual).
    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature, if any.
    pub fn get_signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Whether the method is overridable.
    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    /// Structural match: same name, and same signature when both sides
    /// declare one.
    pub fn matches(&self, other: &MethodInfo) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.signature, &other.signature) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

type CastFn = dyn Fn(&Instance) -> Option<Instance> + Send + Sync;

/// An interface implemented (or, for interfaces, extended) by a type.
#[derive(Clone)]
pub struct InterfaceImpl {
    interface: TypeKey,
    cast: Option<Arc<CastFn>>,
}

impl InterfaceImpl {
    /// The implemented interface.
    pub fn interface(&self) -> &TypeKey {
        &self.interface
    }

    /// View `instance` as the interface. `None` when no cast is known or
    /// the instance does not hold the expected type.
    pub fn cast(&self, instance: &Instance) -> Option<Instance> {
        self.cast.as_ref().and_then(|cast| cast(instance))
    }

    /// Whether this entry can convert instances.
    pub fn has_cast(&self) -> bool {
        self.cast.is_some()
    }
}

impl fmt::Debug for InterfaceImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceImpl")
            .field("interface", &self.interface)
            .field("cast", &self.cast.is_some())
            .finish()
    }
}

type CloseFn = dyn Fn(&TypeKey, &[TypeKey]) -> Option<TypeInfo> + Send + Sync;

/// Everything the runtime knows about one type.
///
/// Built once through [`TypeInfoBuilder`] and immutable afterwards.
pub struct TypeInfo {
    key: TypeKey,
    kind: TypeKind,
    public: bool,
    is_abstract: bool,
    sealed: bool,
    array: bool,
    constructors: Vec<ConstructorInfo>,
    methods: Vec<MethodInfo>,
    interfaces: Vec<InterfaceImpl>,
    aspects: Vec<TypeKey>,
    closer: Option<Arc<CloseFn>>,
    capabilities: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

/// Marker for builders of open generic definitions.
pub enum GenericDefinition {}

impl TypeInfo {
    /// Start describing a class `T`.
    pub fn class<T: ?Sized + 'static>() -> TypeInfoBuilder<T> {
        TypeInfoBuilder::new(TypeKey::of::<T>(), TypeKind::Class)
    }

    /// Start describing an interface, usually `dyn Trait`.
    pub fn interface<T: ?Sized + 'static>() -> TypeInfoBuilder<T> {
        TypeInfoBuilder::new(TypeKey::of::<T>(), TypeKind::Interface)
    }

    /// Start describing an open generic class definition.
    pub fn open_class(definition: &TypeKey) -> TypeInfoBuilder<GenericDefinition> {
        TypeInfoBuilder::new(definition.clone(), TypeKind::Class)
    }

    /// Start describing an open generic interface definition.
    pub fn open_interface(definition: &TypeKey) -> TypeInfoBuilder<GenericDefinition> {
        TypeInfoBuilder::new(definition.clone(), TypeKind::Interface)
    }

    /// The described type.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Class or interface.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether the type is an interface.
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Whether the type is visible to the registry.
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Whether the type is abstract. Interfaces always are.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract || self.is_interface()
    }

    /// Whether the type refuses wrapping.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Whether the type is an array type.
    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Whether the type is an open generic definition.
    pub fn is_open_generic(&self) -> bool {
        self.key.is_open_generic()
    }

    /// Public constructors in declaration order.
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Public instance methods.
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Directly implemented (or extended) interfaces.
    pub fn interfaces(&self) -> &[InterfaceImpl] {
        &self.interfaces
    }

    /// Declarative aspect markers, in declaration order.
    pub fn aspect_markers(&self) -> &[TypeKey] {
        &self.aspects
    }

    /// Close this open definition over `args`.
    pub fn close(&self, args: &[TypeKey]) -> Option<TypeInfo> {
        let closed_key = self.key.close(args)?;
        let closer = self.closer.as_ref()?;
        let mut info = closer(&closed_key, args)?;
        info.key = closed_key;
        Some(info)
    }

    /// Look up an attached capability by type.
    pub fn capability<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.capabilities
            .get(&TypeId::of::<C>())
            .and_then(|c| c.downcast_ref::<C>())
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("public", &self.public)
            .field("abstract", &self.is_abstract)
            .field("sealed", &self.sealed)
            .field("constructors", &self.constructors.len())
            .field("methods", &self.methods)
            .field("interfaces", &self.interfaces)
            .field("aspects", &self.aspects)
            .finish()
    }
}

/// Builder for [`TypeInfo`].
///
/// `T` is the Rust type being described; typed helpers (constructors,
/// interface casts) are only available when it is known.
pub struct TypeInfoBuilder<T: ?Sized> {
    info: TypeInfo,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> TypeInfoBuilder<T> {
    fn new(key: TypeKey, kind: TypeKind) -> Self {
        Self {
            info: TypeInfo {
                key,
                kind,
                public: true,
                is_abstract: false,
                sealed: false,
                array: false,
                constructors: Vec::new(),
                methods: Vec::new(),
                interfaces: Vec::new(),
                aspects: Vec::new(),
                closer: None,
                capabilities: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Override the key, e.g. to describe `Repository<User>` under its
    /// structural closed-generic key.
    pub fn key(mut self, key: TypeKey) -> Self {
        self.info.key = key;
        self
    }

    /// The key being described.
    pub fn type_key(&self) -> &TypeKey {
        &self.info.key
    }

    /// Hide the type from the registry.
    pub fn private(mut self) -> Self {
        self.info.public = false;
        self
    }

    /// Mark the class abstract.
    pub fn abstract_type(mut self) -> Self {
        self.info.is_abstract = true;
        self
    }

    /// Mark the class sealed: it cannot be wrapped in class mode.
    pub fn sealed(mut self) -> Self {
        self.info.sealed = true;
        self
    }

    /// Mark the type as an array type.
    pub fn array(mut self) -> Self {
        self.info.array = true;
        self
    }

    /// Add an untyped constructor.
    pub fn raw_constructor(mut self, constructor: ConstructorInfo) -> Self {
        self.info.constructors.push(constructor);
        self
    }

    /// Declare a public method.
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.info.methods.push(method);
        self
    }

    /// Declare an implemented interface without a cast, for metadata
    /// only (open generic definitions use this).
    pub fn implements_key(mut self, interface: TypeKey) -> Self {
        self.info.interfaces.push(InterfaceImpl {
            interface,
            cast: None,
        });
        self
    }

    /// Attach a declarative aspect marker. Repeatable.
    pub fn aspect(mut self, aspect_type: TypeKey) -> Self {
        self.info.aspects.push(aspect_type);
        self
    }

    /// Attach a capability value retrievable with [`TypeInfo::capability`].
    pub fn capability<C: Any + Send + Sync>(mut self, capability: C) -> Self {
        self.info
            .capabilities
            .insert(TypeId::of::<C>(), Arc::new(capability));
        self
    }

    /// Finish the description.
    pub fn build(self) -> TypeInfo {
        self.info
    }
}

impl<T: ?Sized + Send + Sync + 'static> TypeInfoBuilder<T> {
    /// Declare that `T` implements (or, for interfaces, extends) `I`.
    ///
    /// `cast` turns a shared `T` into the interface view, typically
    /// `|t| t as Arc<dyn I>`.
    pub fn implements<I, F>(self, cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.implements_as::<I, F>(TypeKey::of::<I>(), cast)
    }

    /// Like [`TypeInfoBuilder::implements`] with an explicit interface
    /// key, for closed generic interfaces.
    pub fn implements_as<I, F>(mut self, interface: TypeKey, cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let key = interface.clone();
        let cast: Arc<CastFn> = Arc::new(move |instance: &Instance| {
            instance
                .downcast::<T>()
                .map(|value| Instance::with_key(key.clone(), cast(value)))
        });
        self.info.interfaces.push(InterfaceImpl {
            interface,
            cast: Some(cast),
        });
        self
    }
}

impl<T: Send + Sync + 'static> TypeInfoBuilder<T> {
    /// Add a constructor taking explicit parameters.
    pub fn constructor<F>(self, params: Vec<ParamInfo>, f: F) -> Self
    where
        F: Fn(&ConstructorArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let key = self.info.key.clone();
        self.raw_constructor(ConstructorInfo::new(params, move |args| {
            f(args).map(|value| Instance::with_key(key.clone(), Arc::new(value)))
        }))
    }

    /// Add a parameterless constructor.
    pub fn default_constructor<F>(self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor(Vec::new(), move |_| Ok(f()))
    }

    /// Add a one-parameter constructor.
    pub fn constructor1<A, F>(self, f: F) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<A>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructor(vec![ParamInfo::of::<A>()], move |args| f(args.arg::<A>(0)?))
    }

    /// Add a two-parameter constructor.
    pub fn constructor2<A, B, F>(self, f: F) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<A>, Arc<B>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructor(
            vec![ParamInfo::of::<A>(), ParamInfo::of::<B>()],
            move |args| f(args.arg::<A>(0)?, args.arg::<B>(1)?),
        )
    }
}

impl TypeInfoBuilder<GenericDefinition> {
    /// Supply the function that describes a closed instantiation of this
    /// definition. It receives the closed key and the type arguments;
    /// descriptions it returns should be built under that key (see
    /// [`TypeInfoBuilder::key`]) so constructed instances carry it.
    /// Returning `None` means the instantiation is unknown.
    pub fn closing<F>(mut self, closer: F) -> Self
    where
        F: Fn(&TypeKey, &[TypeKey]) -> Option<TypeInfo> + Send + Sync + 'static,
    {
        self.info.closer = Some(Arc::new(closer));
        self
    }
}
