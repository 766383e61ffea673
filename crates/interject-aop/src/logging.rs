//! A stock aspect that logs intercepted calls.

use std::any::Any;
use std::error::Error as StdError;

use interject_core::TypeInfo;

use crate::aspect::{describe_aspect, Aspect};
use crate::context::InterceptionContext;

/// Logs entry, exit and failure of every intercepted call, with timing.
#[derive(Clone, Copy, Debug)]
pub struct LoggingAspect {
    level: log::Level,
}

impl LoggingAspect {
    /// Log entry and exit at `level`. Failures always log at `warn`.
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }

    /// Catalog description, logging at `debug`.
    pub fn describe() -> TypeInfo {
        describe_aspect(|_| Ok(LoggingAspect::default()))
    }

    /// Catalog description logging at `level`.
    pub fn describe_at(level: log::Level) -> TypeInfo {
        describe_aspect(move |_| Ok(LoggingAspect::new(level)))
    }
}

impl Default for LoggingAspect {
    fn default() -> Self {
        Self::new(log::Level::Debug)
    }
}

impl Aspect for LoggingAspect {
    fn on_executing(&mut self, ctx: &mut InterceptionContext) {
        let args: Vec<String> = ctx
            .arguments()
            .iter()
            .map(|a| format!("{}: {}", a.name(), a.value()))
            .collect();
        log::log!(self.level, "→ {}({})", ctx.signature(), args.join(", "));
    }

    fn on_result(&mut self, ctx: &mut InterceptionContext, _value: &dyn Any) {
        log::log!(
            self.level,
            "← {} (took {:?})",
            ctx.signature(),
            ctx.elapsed()
        );
    }

    fn on_exception(&mut self, ctx: &mut InterceptionContext, error: &(dyn StdError + 'static)) {
        log::warn!(
            "✗ {} failed after {:?}: {error}",
            ctx.signature(),
            ctx.elapsed()
        );
    }
}
