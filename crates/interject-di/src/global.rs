//! The process-wide default registry.

use once_cell::sync::Lazy;

use interject_core::RegistryConfig;

use crate::registry::Registry;

static GLOBAL: Lazy<Registry> = Lazy::new(|| {
    let config = RegistryConfig::load(None).unwrap_or_else(|e| {
        log::warn!("failed to load registry config, using defaults: {e}");
        RegistryConfig::default()
    });
    Registry::from_config(config)
});

impl Registry {
    /// The shared default registry, created on first use from the loaded
    /// configuration.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }
}
