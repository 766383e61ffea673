//! Bulk registration over a set of candidate types.

use interject_core::{Result, TypeInfo, TypeKey};

use crate::handle::Registration;
use crate::registry::Registry;

impl Registry {
    /// Register every candidate that implements an interface derived from
    /// `base`.
    ///
    /// Candidates must be described, public, concrete, closed classes with
    /// a constructor; others are skipped. Each candidate is registered
    /// once per implemented interface that extends (and is not) `base`.
    pub fn register_assembly(
        &self,
        base: &TypeKey,
        candidates: &[TypeKey],
    ) -> Result<Vec<Registration>> {
        let mut registrations = Vec::new();
        for candidate in candidates {
            let Some(info) = self.catalog.get(candidate) else {
                log::debug!("skipping {candidate}: not described");
                continue;
            };
            if !is_candidate(&info) {
                log::debug!("skipping {candidate}: not a constructible public class");
                continue;
            }
            for interface in self.catalog.interfaces_of(candidate) {
                if &interface == base || !self.catalog.is_assignable(&interface, base) {
                    continue;
                }
                registrations.push(self.register_implementation(&interface, candidate)?);
            }
        }
        log::debug!(
            "registered {} implementation(s) of {base}-derived services",
            registrations.len()
        );
        Ok(registrations)
    }
}

fn is_candidate(info: &TypeInfo) -> bool {
    !info.is_interface()
        && info.is_public()
        && !info.is_abstract()
        && !info.is_array()
        && !info.is_open_generic()
        && !info.constructors().is_empty()
}
