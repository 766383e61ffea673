//! Service groups: every entry registered under one service type.

use std::sync::Arc;

use parking_lot::Mutex;

use interject_core::TypeKey;

use crate::entry::{RegistrationEntry, Strategy};
use crate::key::ServiceKey;

/// How to pick an entry from a group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selector {
    /// The most recently registered entry.
    #[default]
    Default,
    /// The most recent entry with this exact name.
    Name(String),
    /// The most recent entry with this exact key.
    Key(ServiceKey),
}

/// Ordered entries for one service type.
pub struct ServiceGroup {
    service: TypeKey,
    entries: Mutex<Vec<Arc<RegistrationEntry>>>,
}

impl ServiceGroup {
    /// Empty group for `service`.
    pub fn new(service: TypeKey) -> Self {
        Self {
            service,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// The service type.
    pub fn service(&self) -> &TypeKey {
        &self.service
    }

    /// Add an entry for `strategy` unless an identical one exists.
    ///
    /// Returns the entry and whether it was newly added.
    pub fn insert(&self, strategy: Strategy, aop: bool) -> (Arc<RegistrationEntry>, bool) {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.iter().find(|e| e.strategy().same_as(&strategy)) {
            log::debug!(
                "{} already has an identical {} registration",
                self.service,
                strategy.kind()
            );
            return (existing.clone(), false);
        }
        let entry = Arc::new(RegistrationEntry::new(self.service.clone(), strategy, aop));
        entries.push(entry.clone());
        (entry, true)
    }

    /// Pick an entry.
    pub fn select(&self, selector: &Selector) -> Option<Arc<RegistrationEntry>> {
        match selector {
            Selector::Default => self.default_entry(),
            Selector::Name(name) => self.by_name(name),
            Selector::Key(key) => self.by_key(key),
        }
    }

    /// The most recently registered entry.
    pub fn default_entry(&self) -> Option<Arc<RegistrationEntry>> {
        self.entries.lock().last().cloned()
    }

    /// The most recent entry named `name`.
    pub fn by_name(&self, name: &str) -> Option<Arc<RegistrationEntry>> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|e| e.has_name(name))
            .cloned()
    }

    /// The most recent entry keyed `key`.
    pub fn by_key(&self, key: &ServiceKey) -> Option<Arc<RegistrationEntry>> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|e| e.has_key(key))
            .cloned()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> Vec<Arc<RegistrationEntry>> {
        self.entries.lock().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the group has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for ServiceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGroup")
            .field("service", &self.service)
            .field("entries", &self.entries())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn implementation<T: 'static>() -> Strategy {
        Strategy::Implementation(TypeKey::of::<T>())
    }

    #[test]
    fn test_insert_dedups() {
        let group = ServiceGroup::new(TypeKey::of::<u8>());
        let (first, added) = group.insert(implementation::<u8>(), false);
        assert!(added);
        let (second, added) = group.insert(implementation::<u8>(), true);
        assert!(!added);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.is_aop());
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_default_is_most_recent() {
        let group = ServiceGroup::new(TypeKey::of::<u8>());
        group.insert(implementation::<u8>(), false);
        let (last, _) = group.insert(implementation::<u16>(), false);
        assert!(Arc::ptr_eq(&group.default_entry().unwrap(), &last));
    }

    #[test]
    fn test_by_name_and_key_need_exact_match() {
        let group = ServiceGroup::new(TypeKey::of::<u8>());
        let (a, _) = group.insert(implementation::<u8>(), false);
        a.set_name("a".into());
        let (b, _) = group.insert(implementation::<u16>(), false);
        b.set_key(ServiceKey::new(2u8));

        assert!(Arc::ptr_eq(&group.by_name("a").unwrap(), &a));
        assert!(group.by_name("A").is_none());
        assert!(Arc::ptr_eq(&group.by_key(&ServiceKey::new(2u8)).unwrap(), &b));
        assert!(group.by_key(&ServiceKey::new(2u16)).is_none());
        assert!(group.select(&Selector::Name("b".into())).is_none());
    }

    #[test]
    fn test_empty_group() {
        let group = ServiceGroup::new(TypeKey::of::<u8>());
        assert!(group.is_empty());
        assert!(group.select(&Selector::Default).is_none());
    }
}
