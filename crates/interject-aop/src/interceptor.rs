//! The per-call interception pipeline.
//!
//! Every generated wrapper method funnels through [`Interceptor::invoke`]
//! (fallible methods) or [`Interceptor::invoke_infallible`]. The pipeline:
//!
//! 1. no factories bound, or method not interceptable: call the target;
//! 2. build a fresh [`InterceptionContext`];
//! 3. materialize one aspect per factory, skipping factories that fail,
//!    then run every `on_executing` hook in binding order;
//! 4. call the target;
//! 5. run every `on_exception` or every `on_result` hook in binding order;
//! 6. dispose disposable aspects and hand back the untouched outcome.
//!
//! Disposal is tied to a scope guard, so it also runs when a hook or the
//! target panics.

use std::any::Any;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use interject_core::TypeKey;

use crate::aspect::{Aspect, AspectFactory};
use crate::context::{Argument, InterceptionContext};

/// Which methods of a wrapper run through the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every method (interface mode).
    All,
    /// Only the named methods (class mode).
    Only(HashSet<String>),
}

impl MethodFilter {
    /// Whether `method` passes the filter.
    pub fn allows(&self, method: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(method),
        }
    }
}

/// Interception state held by one wrapper instance.
pub struct Interceptor {
    target_type: TypeKey,
    filter: MethodFilter,
    factories: Vec<Arc<dyn AspectFactory>>,
}

impl Interceptor {
    /// Interceptor for `target_type` with the given factories, in order.
    pub fn new(
        target_type: TypeKey,
        filter: MethodFilter,
        factories: Vec<Arc<dyn AspectFactory>>,
    ) -> Self {
        Self {
            target_type,
            filter,
            factories,
        }
    }

    /// Interceptor that never intercepts.
    pub fn passthrough(target_type: TypeKey) -> Self {
        Self::new(target_type, MethodFilter::All, Vec::new())
    }

    /// The wrapped type.
    pub fn target_type(&self) -> &TypeKey {
        &self.target_type
    }

    /// Bound factories, static first.
    pub fn factories(&self) -> &[Arc<dyn AspectFactory>] {
        &self.factories
    }

    /// Method filter.
    pub fn filter(&self) -> &MethodFilter {
        &self.filter
    }

    /// Whether any factory is bound.
    pub fn is_active(&self) -> bool {
        !self.factories.is_empty()
    }

    /// Whether a call to `method` runs the pipeline.
    pub fn intercepts(&self, method: &str) -> bool {
        self.is_active() && self.filter.allows(method)
    }

    /// Run a fallible call through the pipeline.
    ///
    /// Generated wrappers check [`Interceptor::intercepts`] before rendering
    /// `arguments`, so unconfigured calls pay nothing for them.
    pub fn invoke<T, E, F>(&self, method: &'static str, arguments: Vec<Argument>, call: F) -> Result<T, E>
    where
        T: Any,
        E: StdError + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        if !self.intercepts(method) {
            return call();
        }

        let mut ctx = InterceptionContext::new(self.target_type.clone(), method, arguments);
        let mut scope = self.materialize(&mut ctx);
        scope.executing(&mut ctx);

        let outcome = call();
        match &outcome {
            Ok(value) => scope.result(&mut ctx, value),
            Err(error) => scope.exception(&mut ctx, error),
        }
        outcome
    }

    /// Run an infallible call through the pipeline.
    pub fn invoke_infallible<T, F>(&self, method: &'static str, arguments: Vec<Argument>, call: F) -> T
    where
        T: Any,
        F: FnOnce() -> T,
    {
        if !self.intercepts(method) {
            return call();
        }

        let mut ctx = InterceptionContext::new(self.target_type.clone(), method, arguments);
        let mut scope = self.materialize(&mut ctx);
        scope.executing(&mut ctx);

        let value = call();
        scope.result(&mut ctx, &value);
        value
    }

    fn materialize(&self, ctx: &mut InterceptionContext) -> AspectScope {
        let mut aspects = Vec::with_capacity(self.factories.len());
        for factory in &self.factories {
            match factory.create(ctx) {
                Ok(aspect) => {
                    ctx.push_aspect(factory.aspect_type().clone());
                    aspects.push(aspect);
                }
                Err(e) => log::debug!(
                    "skipping aspect {} for {}: {e}",
                    factory.aspect_type(),
                    ctx.signature()
                ),
            }
        }
        AspectScope { aspects }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aspects: Vec<&TypeKey> = self.factories.iter().map(|f| f.aspect_type()).collect();
        f.debug_struct("Interceptor")
            .field("target_type", &self.target_type)
            .field("filter", &self.filter)
            .field("aspects", &aspects)
            .finish()
    }
}

/// Aspects materialized for one call. Disposes them when dropped.
struct AspectScope {
    aspects: Vec<Box<dyn Aspect>>,
}

impl AspectScope {
    fn executing(&mut self, ctx: &mut InterceptionContext) {
        for aspect in &mut self.aspects {
            aspect.on_executing(ctx);
        }
    }

    fn result(&mut self, ctx: &mut InterceptionContext, value: &dyn Any) {
        for aspect in &mut self.aspects {
            aspect.on_result(ctx, value);
        }
    }

    fn exception(&mut self, ctx: &mut InterceptionContext, error: &(dyn StdError + 'static)) {
        for aspect in &mut self.aspects {
            aspect.on_exception(ctx, error);
        }
    }
}

impl Drop for AspectScope {
    fn drop(&mut self) {
        for aspect in &mut self.aspects {
            if let Some(disposable) = aspect.as_disposable() {
                disposable.dispose();
            }
        }
    }
}
