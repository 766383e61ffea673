//! A small checkout service graph used by `interject demo` and `inspect`.
//!
//! `Checkout` is built by constructor injection from a `PriceList`, and
//! both are wrapped with [`LoggingAspect`], so every call shows up in the
//! log at `info`.

use std::collections::BTreeMap;
use std::sync::Arc;

use interject_aop::{interface_proxy, LoggingAspect, ProxiedBy};
use interject_core::{Error, Instance, RegistryConfig, Result, TypeInfo};
use interject_di::Registry;
use serde::Serialize;

// ============================================================================
// Services
// ============================================================================

/// Pricing failures.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// The item has no price.
    #[error("no price for '{0}'")]
    Unknown(String),
}

/// Looks up unit prices in cents.
pub trait PriceList: Send + Sync {
    fn price(&self, item: &str) -> std::result::Result<u64, PricingError>;
}

interface_proxy! {
    pub struct PriceListProxy for dyn PriceList {
        fn price(&self, item: &str) -> Result<u64, PricingError>;
    }
}

/// Totals a basket.
pub trait Checkout: Send + Sync {
    fn total(&self, items: &[String]) -> std::result::Result<u64, PricingError>;
}

interface_proxy! {
    pub struct CheckoutProxy for dyn Checkout {
        fn total(&self, items: &[String]) -> Result<u64, PricingError>;
    }
}

/// The regular price list.
pub struct ShelfPrices(BTreeMap<&'static str, u64>);

impl Default for ShelfPrices {
    fn default() -> Self {
        Self(BTreeMap::from([("apple", 120), ("pear", 95), ("plum", 60)]))
    }
}

impl PriceList for ShelfPrices {
    fn price(&self, item: &str) -> std::result::Result<u64, PricingError> {
        self.0
            .get(item)
            .copied()
            .ok_or_else(|| PricingError::Unknown(item.to_string()))
    }
}

/// Everything at half the shelf price.
pub struct SalePrices(ShelfPrices);

impl PriceList for SalePrices {
    fn price(&self, item: &str) -> std::result::Result<u64, PricingError> {
        self.0.price(item).map(|p| p / 2)
    }
}

/// Sums prices from whichever list it was built with.
pub struct Register {
    prices: Arc<dyn PriceList>,
}

impl Checkout for Register {
    fn total(&self, items: &[String]) -> std::result::Result<u64, PricingError> {
        items.iter().map(|item| self.prices.price(item)).sum()
    }
}

// ============================================================================
// Registry setup
// ============================================================================

/// Describe the demo types and register them.
///
/// The shelf list is the default `PriceList`; the sale list is registered
/// under the name `"sale"`.
pub fn build_registry(config: RegistryConfig) -> Result<Registry> {
    let registry = Registry::from_config(config);
    registry
        .describe(LoggingAspect::describe_at(log::Level::Info))
        .describe(
            TypeInfo::interface::<dyn PriceList>()
                .proxied_by::<PriceListProxy>()
                .build(),
        )
        .describe(
            TypeInfo::interface::<dyn Checkout>()
                .proxied_by::<CheckoutProxy>()
                .build(),
        )
        .describe(
            TypeInfo::class::<ShelfPrices>()
                .default_constructor(ShelfPrices::default)
                .implements::<dyn PriceList, _>(|p| p as Arc<dyn PriceList>)
                .build(),
        )
        .describe(
            TypeInfo::class::<Register>()
                .constructor1::<dyn PriceList, _>(|prices| Ok(Register { prices }))
                .implements::<dyn Checkout, _>(|r| r as Arc<dyn Checkout>)
                .build(),
        );

    let sale: Arc<dyn PriceList> = Arc::new(SalePrices(ShelfPrices::default()));
    registry
        .register_instance(sale)
        .name("sale")
        .aspect_of::<LoggingAspect>();
    registry
        .register_type::<dyn PriceList, ShelfPrices>()?
        .aspect_of::<LoggingAspect>();
    registry
        .register_type::<dyn Checkout, Register>()?
        .aspect_of::<LoggingAspect>();

    Ok(registry)
}

// ============================================================================
// Commands
// ============================================================================

/// Price `items`, optionally against a named price list.
pub fn run_demo(registry: &Registry, items: &[String], prices: Option<&str>) -> Result<u64> {
    let checkout: Arc<dyn Checkout> = match prices {
        None => registry.get::<dyn Checkout>()?,
        Some(name) => {
            let list = registry
                .get_by_name::<dyn PriceList>(name)?
                .ok_or_else(|| Error::not_found(format!("price list '{name}'")))?;
            registry.get_with_args::<dyn Checkout>(&[Some(Instance::from_arc(list))])?
        }
    }
    .ok_or_else(|| Error::not_found("Checkout"))?;

    tracing::debug!(items = items.len(), "pricing basket");
    checkout.total(items).map_err(Error::construction)
}

/// One registration, as shown by `inspect`.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub service: String,
    pub entry: String,
    pub resolvable: bool,
}

/// Describe every registration in `registry`, grouped by service.
pub fn inspect(registry: &Registry) -> Vec<EntryReport> {
    registry
        .groups()
        .into_iter()
        .flat_map(|group| {
            let service = group.service().clone();
            let resolvable = registry.can_resolve(&service);
            group
                .entries()
                .into_iter()
                .map(move |entry| EntryReport {
                    service: service.to_string(),
                    entry: entry.to_string(),
                    resolvable,
                })
        })
        .collect()
}

/// Render `inspect` output as text or JSON.
pub fn render_inspect(reports: &[EntryReport], json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(reports).map_err(|e| Error::config(e.to_string()));
    }
    let lines: Vec<String> = reports
        .iter()
        .map(|r| {
            let mark = if r.resolvable { "" } else { " (unresolvable)" };
            format!("{}{mark}\n  {}", r.service, r.entry)
        })
        .collect();
    Ok(lines.join("\n"))
}

// ============================================================================
// Tests
// ============================================================================
