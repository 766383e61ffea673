//! The aspect contract.
//!
//! An [`Aspect`] observes one intercepted call through three hooks. For a
//! single call, `on_executing` runs first and is followed by exactly one of
//! `on_result` or `on_exception`. Aspects observe; they never change the
//! value or error the caller receives.
//!
//! Hooks are infallible. The only fallible step of the pipeline is aspect
//! construction through an [`AspectFactory`], and a failing factory is
//! skipped for that call.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use interject_core::{Result, TypeInfo, TypeKey};

use crate::context::InterceptionContext;

/// Cross-cutting behavior around an intercepted call.
pub trait Aspect: Send {
    /// Before the real call.
    fn on_executing(&mut self, _ctx: &mut InterceptionContext) {}

    /// After a normal return, with the returned value.
    fn on_result(&mut self, _ctx: &mut InterceptionContext, _value: &dyn Any) {}

    /// After the real call failed, with its error.
    fn on_exception(&mut self, _ctx: &mut InterceptionContext, _error: &(dyn StdError + 'static)) {}

    /// Opt into disposal at the end of the call.
    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        None
    }
}

/// Cleanup that runs once, after the last hook of a call.
pub trait Disposable {
    /// Release resources held for the call.
    fn dispose(&mut self);
}

/// Produces a fresh aspect for each intercepted call.
pub trait AspectFactory: Send + Sync {
    /// Type of the aspects this factory produces.
    fn aspect_type(&self) -> &TypeKey;

    /// Create the aspect for one call.
    fn create(&self, ctx: &InterceptionContext) -> Result<Box<dyn Aspect>>;
}

type CreateFn = dyn Fn(&InterceptionContext) -> Result<Box<dyn Aspect>> + Send + Sync;

/// [`AspectFactory`] backed by a closure.
#[derive(Clone)]
pub struct FnAspectFactory {
    aspect_type: TypeKey,
    create: Arc<CreateFn>,
}

impl FnAspectFactory {
    /// Factory for aspects of type `A`.
    pub fn new<A, F>(create: F) -> Self
    where
        A: Aspect + 'static,
        F: Fn(&InterceptionContext) -> Result<A> + Send + Sync + 'static,
    {
        Self {
            aspect_type: TypeKey::of::<A>(),
            create: Arc::new(move |ctx: &InterceptionContext| {
                create(ctx).map(|a| Box::new(a) as Box<dyn Aspect>)
            }),
        }
    }
}

impl AspectFactory for FnAspectFactory {
    fn aspect_type(&self) -> &TypeKey {
        &self.aspect_type
    }

    fn create(&self, ctx: &InterceptionContext) -> Result<Box<dyn Aspect>> {
        (self.create)(ctx)
    }
}

impl fmt::Debug for FnAspectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAspectFactory")
            .field("aspect_type", &self.aspect_type)
            .finish()
    }
}

/// Capability marking a described type as an aspect type.
///
/// Aspect markers (on a type or a registration) name aspect types by
/// [`TypeKey`]; only keys whose [`TypeInfo`] carries this capability are
/// bound.
#[derive(Clone)]
pub struct AspectConstructor(Arc<dyn AspectFactory>);

impl AspectConstructor {
    /// Capability building `A` with `create`.
    pub fn new<A, F>(create: F) -> Self
    where
        A: Aspect + 'static,
        F: Fn(&InterceptionContext) -> Result<A> + Send + Sync + 'static,
    {
        Self(Arc::new(FnAspectFactory::new(create)))
    }

    /// Capability from an existing factory.
    pub fn from_factory(factory: Arc<dyn AspectFactory>) -> Self {
        Self(factory)
    }

    /// The underlying factory.
    pub fn factory(&self) -> Arc<dyn AspectFactory> {
        self.0.clone()
    }
}

impl fmt::Debug for AspectConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AspectConstructor({})", self.0.aspect_type())
    }
}

/// Describe aspect type `A` for the catalog.
pub fn describe_aspect<A, F>(create: F) -> TypeInfo
where
    A: Aspect + 'static,
    F: Fn(&InterceptionContext) -> Result<A> + Send + Sync + 'static,
{
    TypeInfo::class::<A>()
        .capability(AspectConstructor::new(create))
        .build()
}
