//! Shared fixtures for the scenario tests.

#![allow(dead_code)]

use std::any::Any;
use std::error::Error as StdError;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use interject::prelude::*;
use parking_lot::Mutex;

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot divide {0} by {1}")]
pub struct DivideError(pub i64, pub i64);

pub trait Foo: Send + Sync {
    fn name(&self) -> String;
    fn divide(&self, a: i64, b: i64) -> Result<i64, DivideError>;
}

interface_proxy! {
    pub struct FooProxy for dyn Foo {
        fn name(&self) -> String;
        fn divide(&self, a: i64, b: i64) -> Result<i64, DivideError>;
    }
}

pub struct FooImpl;

impl Foo for FooImpl {
    fn name(&self) -> String {
        "foo".into()
    }

    fn divide(&self, a: i64, b: i64) -> Result<i64, DivideError> {
        a.checked_div(b).ok_or(DivideError(a, b))
    }
}

pub struct AltFoo;

impl Foo for AltFoo {
    fn name(&self) -> String {
        "alt".into()
    }

    fn divide(&self, _a: i64, _b: i64) -> Result<i64, DivideError> {
        Ok(0)
    }
}

pub trait Bar: Send + Sync {
    fn value(&self) -> u32;
}

pub struct BarImpl;

impl Bar for BarImpl {
    fn value(&self) -> u32 {
        7
    }
}

/// Needs a `Bar` to be built.
pub struct Service {
    pub bar: Arc<dyn Bar>,
}

// ============================================================================
// Generics
// ============================================================================

pub trait Repository<T>: Send + Sync {
    fn entity(&self) -> &'static str;
}

pub struct MemoryRepository<T>(PhantomData<fn() -> T>);

impl<T: 'static> Repository<T> for MemoryRepository<T> {
    fn entity(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

pub struct User;
pub struct Order;

pub fn repository_key() -> TypeKey {
    TypeKey::open("Repository", 1)
}

pub fn memory_repository_key() -> TypeKey {
    TypeKey::open("MemoryRepository", 1)
}

pub fn repository_of<T: 'static>() -> TypeKey {
    TypeKey::closed(&repository_key(), vec![TypeKey::of::<T>()])
}

fn close_repository<T: 'static>(key: &TypeKey) -> TypeInfo {
    TypeInfo::interface::<dyn Repository<T>>().key(key.clone()).build()
}

fn close_memory_repository<T: 'static>(key: &TypeKey, service: TypeKey) -> TypeInfo {
    TypeInfo::class::<MemoryRepository<T>>()
        .key(key.clone())
        .default_constructor(|| MemoryRepository::<T>(PhantomData))
        .implements_as::<dyn Repository<T>, _>(service, |r| r as Arc<dyn Repository<T>>)
        .build()
}

// ============================================================================
// Aspects
// ============================================================================

/// Shared event log written by the recording aspects.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Records every hook as `"<N>:<hook>:<method>"`.
pub struct Step<const N: usize> {
    log: Log,
}

impl<const N: usize> Aspect for Step<N> {
    fn on_executing(&mut self, ctx: &mut InterceptionContext) {
        self.log.push(format!("{N}:before:{}", ctx.method()));
    }

    fn on_result(&mut self, ctx: &mut InterceptionContext, _value: &dyn Any) {
        self.log.push(format!("{N}:result:{}", ctx.method()));
    }

    fn on_exception(&mut self, ctx: &mut InterceptionContext, _error: &(dyn StdError + 'static)) {
        self.log.push(format!("{N}:error:{}", ctx.method()));
    }
}

pub fn step<const N: usize>() -> TypeKey {
    TypeKey::of::<Step<N>>()
}

fn describe_step<const N: usize>(log: &Log) -> TypeInfo {
    let log = log.clone();
    describe_aspect(move |_| Ok(Step::<N> { log: log.clone() }))
}

/// An aspect whose factory always fails.
pub struct Broken;

impl Aspect for Broken {}

/// Counts disposals.
pub struct Scoped {
    disposed: Arc<AtomicUsize>,
}

impl Aspect for Scoped {
    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        Some(self)
    }
}

impl Disposable for Scoped {
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Registry fixture
// ============================================================================

/// Catalog with every fixture type described.
pub fn describe_all(catalog: &Catalog, log: &Log, disposed: &Arc<AtomicUsize>) {
    catalog.describe(describe_step::<1>(log));
    catalog.describe(describe_step::<2>(log));
    catalog.describe(describe_step::<3>(log));
    catalog.describe(describe_aspect::<Broken, _>(|_| {
        Err(Error::aspect("broken on purpose"))
    }));
    let disposed = disposed.clone();
    catalog.describe(describe_aspect(move |_| {
        Ok(Scoped {
            disposed: disposed.clone(),
        })
    }));
    catalog.describe(LoggingAspect::describe());

    catalog.describe(
        TypeInfo::interface::<dyn Foo>()
            .method(MethodInfo::named("name"))
            .method(MethodInfo::named("divide"))
            .proxied_by::<FooProxy>()
            .build(),
    );
    catalog.describe(
        TypeInfo::class::<FooImpl>()
            .default_constructor(|| FooImpl)
            .implements::<dyn Foo, _>(|f| f as Arc<dyn Foo>)
            .build(),
    );
    catalog.describe(
        TypeInfo::class::<AltFoo>()
            .default_constructor(|| AltFoo)
            .implements::<dyn Foo, _>(|f| f as Arc<dyn Foo>)
            .build(),
    );
    catalog.describe(TypeInfo::interface::<dyn Bar>().build());
    catalog.describe(
        TypeInfo::class::<BarImpl>()
            .default_constructor(|| BarImpl)
            .implements::<dyn Bar, _>(|b| b as Arc<dyn Bar>)
            .build(),
    );
    catalog.describe(
        TypeInfo::class::<Service>()
            .constructor1::<dyn Bar, _>(|bar| Ok(Service { bar }))
            .build(),
    );

    catalog.describe(
        TypeInfo::open_interface(&repository_key())
            .closing(|key, args| {
                if args[0] == TypeKey::of::<User>() {
                    Some(close_repository::<User>(key))
                } else if args[0] == TypeKey::of::<Order>() {
                    Some(close_repository::<Order>(key))
                } else {
                    None
                }
            })
            .build(),
    );
    catalog.describe(
        TypeInfo::open_class(&memory_repository_key())
            .implements_key(repository_key())
            .closing(|key, args| {
                let service = repository_key().close(args)?;
                if args[0] == TypeKey::of::<User>() {
                    Some(close_memory_repository::<User>(key, service))
                } else if args[0] == TypeKey::of::<Order>() {
                    Some(close_memory_repository::<Order>(key, service))
                } else {
                    None
                }
            })
            .build(),
    );
}

/// Everything a scenario needs.
pub struct Fixture {
    pub registry: Registry,
    pub log: Log,
    pub disposed: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let registry = Registry::from_config(config);
        let log = Log::default();
        let disposed = Arc::new(AtomicUsize::new(0));
        describe_all(registry.catalog(), &log, &disposed);
        Self {
            registry,
            log,
            disposed,
        }
    }

    pub fn foo(&self) -> Arc<dyn Foo> {
        self.registry.get::<dyn Foo>().unwrap().unwrap()
    }
}
