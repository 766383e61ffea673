//! Resolution hooks.

use interject_core::{Instance, TypeKey};

use crate::entry::RegistrationEntry;
use crate::registry::Registry;

/// What is about to be constructed.
#[derive(Debug)]
pub struct ResolveRequest<'a> {
    /// The requested service type.
    pub service: &'a TypeKey,
    /// The selected entry.
    pub entry: &'a RegistrationEntry,
    /// Explicit constructor arguments, if any.
    pub args: Option<&'a [Option<Instance>]>,
}

/// Observer that runs before an entry's strategy is used.
///
/// Returning `Some` substitutes the result outright: the strategy does not
/// run and the value is not wrapped.
pub trait ResolveHook: Send + Sync {
    /// Called once per resolution, before construction.
    fn before_create(&self, registry: &Registry, request: &ResolveRequest<'_>) -> Option<Instance>;
}

impl<F> ResolveHook for F
where
    F: Fn(&Registry, &ResolveRequest<'_>) -> Option<Instance> + Send + Sync,
{
    fn before_create(&self, registry: &Registry, request: &ResolveRequest<'_>) -> Option<Instance> {
        self(registry, request)
    }
}
