use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{Category, ProviderProfile, Service, ServiceSummary, Testimonial};

static BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Read-only marketplace data, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
}

impl Catalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("built-in catalog is invalid")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid catalog file: {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;

        let mut seen = std::collections::HashSet::new();
        for service in &catalog.services {
            anyhow::ensure!(
                seen.insert(service.id.as_str()),
                "duplicate service id: {}",
                service.id
            );
        }

        Ok(catalog)
    }

    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn services_in(&self, category: Category) -> Vec<Service> {
        self.services
            .iter()
            .filter(|s| s.category == category)
            .cloned()
            .collect()
    }

    pub fn providers_in(&self, category: Category) -> Vec<ProviderProfile> {
        self.providers
            .iter()
            .filter(|p| p.categories.contains(&category))
            .cloned()
            .collect()
    }

    pub fn summaries(&self) -> Vec<ServiceSummary<'_>> {
        self.services.iter().map(Service::summary).collect()
    }
}
