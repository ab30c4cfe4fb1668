// Catalog loading: the unit selector and its offline fallback
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::BookingBackend;
use crate::money::format_nightly_price;
use crate::unit::{fallback_units, PriceTier, Unit, UnitId};

pub const PLACEHOLDER_LABEL: &str = "Choose an apartment";

#[derive(Debug, Clone, PartialEq)]
pub struct UnitOption {
    pub label: String,
    pub unit: Unit,
}

impl From<Unit> for UnitOption {
    fn from(unit: Unit) -> Self {
        Self {
            label: format!("{} - {}", unit.name, format_nightly_price(unit.price_per_night)),
            unit,
        }
    }
}

/// Selection control for units.
///
/// The placeholder entry is always first and is never replaced; every other
/// entry carries its unit so the summary and quote can read its price and
/// image later.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSelector {
    placeholder: String,
    options: Vec<UnitOption>,
}

impl Default for UnitSelector {
    fn default() -> Self {
        Self {
            placeholder: PLACEHOLDER_LABEL.to_string(),
            options: Vec::new(),
        }
    }
}

impl UnitSelector {
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn options(&self) -> &[UnitOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn replace_options(&mut self, units: Vec<Unit>) {
        self.options = units.into_iter().map(UnitOption::from).collect();
    }

    pub fn find(&self, id: &UnitId) -> Option<&Unit> {
        self.options
            .iter()
            .map(|option| &option.unit)
            .find(|unit| &unit.id == id)
    }

    pub fn in_tier(&self, tier: PriceTier) -> impl Iterator<Item = &UnitOption> {
        self.options.iter().filter(move |option| tier.matches(&option.unit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Backend,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCatalog {
    pub units: Vec<Unit>,
    pub source: CatalogSource,
}

pub struct CatalogLoader<B> {
    backend: Arc<B>,
}

impl<B: BookingBackend> CatalogLoader<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    // One request, no retry. Any failure downgrades to the fallback list.
    pub async fn load_units(&self) -> LoadedCatalog {
        match self.backend.list_units().await {
            Ok(units) => {
                debug!(count = units.len(), "loaded units from backend");
                LoadedCatalog {
                    units,
                    source: CatalogSource::Backend,
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to load units, using fallback catalog");
                LoadedCatalog {
                    units: fallback_units(),
                    source: CatalogSource::Fallback,
                }
            }
        }
    }

    pub async fn populate(&self, selector: &mut UnitSelector) -> CatalogSource {
        let catalog = self.load_units().await;
        selector.replace_options(catalog.units);
        catalog.source
    }

    pub async fn unit_details(&self, id: &UnitId) -> Option<Unit> {
        match self.backend.unit_details(id).await {
            Ok(unit) => Some(unit),
            Err(e) => {
                warn!(unit_id = %id, error = %e, "failed to fetch unit details");
                None
            }
        }
    }
}
