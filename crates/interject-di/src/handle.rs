//! The fluent handle returned by every registration.

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use interject_core::TypeKey;

use crate::entry::RegistrationEntry;
use crate::key::ServiceKey;

/// Handle to the entry a registration created (or found).
///
/// Every method mutates that entry and hands the handle back for chaining.
/// A handle from a duplicate registration (see [`Registration::is_new`])
/// is inert: its setters leave the existing entry untouched.
#[derive(Clone)]
pub struct Registration {
    entry: Arc<RegistrationEntry>,
    added: bool,
}

impl Registration {
    pub(crate) fn new(entry: Arc<RegistrationEntry>, added: bool) -> Self {
        Self { entry, added }
    }

    fn update(self, what: &str, apply: impl FnOnce(&RegistrationEntry)) -> Self {
        if self.added {
            apply(&self.entry);
        } else {
            log::debug!(
                "ignoring {what} on duplicate registration of {}",
                self.entry.service()
            );
        }
        self
    }

    /// Name the entry.
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update("name", |entry| entry.set_name(name))
    }

    /// Key the entry with any `Eq + Hash + Debug` value.
    pub fn key<K: Any + Send + Sync + fmt::Debug + Eq + Hash>(self, key: K) -> Self {
        self.update("key", |entry| entry.set_key(ServiceKey::new(key)))
    }

    /// Turn interception on or off.
    pub fn aop(self, enabled: bool) -> Self {
        self.update("aop", |entry| entry.set_aop(enabled))
    }

    /// Bind an aspect type to this registration and turn interception on.
    pub fn aspect(self, aspect_type: TypeKey) -> Self {
        self.update("aspect", |entry| {
            entry.add_aspect(aspect_type);
            entry.set_aop(true);
        })
    }

    /// Typed form of [`Registration::aspect`].
    pub fn aspect_of<A: Any>(self) -> Self {
        self.aspect(TypeKey::of::<A>())
    }

    /// The underlying entry.
    pub fn entry(&self) -> &Arc<RegistrationEntry> {
        &self.entry
    }

    /// Whether the registration added a new entry. False for duplicates,
    /// whose handle does not change the existing entry.
    pub fn is_new(&self) -> bool {
        self.added
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("entry", &self.entry)
            .field("added", &self.added)
            .finish()
    }
}
