use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::{Category, Service};
use crate::services::recommendation::RecommendationService;

pub const KEYWORD_MESSAGE: &str = "Here is what we found matching your search.";
pub const APOLOGY_MESSAGE: &str =
    "I couldn't process that request right now. Please browse our categories.";

/// Which rung of the cascade produced the result.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    /// Blank query: the caller should show the unfiltered catalog.
    Reset,
    SuggestedServices,
    Category,
    CategoryKeyword,
    Keyword,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchOutcome {
    pub tier: SearchTier,
    pub services: Vec<Service>,
    pub message: Option<String>,
}

/// Resolve `query` into a filtered service list. Never fails: a broken
/// recommendation backend degrades to an empty list with an apology.
pub async fn resolve(
    catalog: &Catalog,
    recommender: &dyn RecommendationService,
    query: &str,
) -> SearchOutcome {
    if query.trim().is_empty() {
        return SearchOutcome {
            tier: SearchTier::Reset,
            services: catalog.services.clone(),
            message: None,
        };
    }

    let rec = match recommender.recommend(query, catalog).await {
        Ok(rec) => rec,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "recommendation failed, giving up on search");
            return SearchOutcome {
                tier: SearchTier::Unavailable,
                services: vec![],
                message: Some(APOLOGY_MESSAGE.to_string()),
            };
        }
    };

    let (tier, services, message) = if !rec.suggested_service_ids.is_empty() {
        // Catalog order, not suggestion order; unknown ids are dropped.
        let services = catalog
            .services
            .iter()
            .filter(|s| rec.suggested_service_ids.contains(&s.id))
            .cloned()
            .collect();
        (SearchTier::SuggestedServices, services, rec.reasoning)
    } else if let Some(suggested) = rec.recommended_category.as_deref() {
        match Category::parse(suggested) {
            Some(category) => (SearchTier::Category, catalog.services_in(category), rec.reasoning),
            None => (
                SearchTier::CategoryKeyword,
                keyword_match(catalog, query, true),
                rec.reasoning,
            ),
        }
    } else {
        (
            SearchTier::Keyword,
            keyword_match(catalog, query, false),
            KEYWORD_MESSAGE.to_string(),
        )
    };

    tracing::info!(query, tier = ?tier, results = services.len(), "search resolved");

    SearchOutcome {
        tier,
        services,
        message: Some(message),
    }
}

/// Case-insensitive substring match of the raw query over name and
/// description, and over category too when `include_category` is set.
fn keyword_match(catalog: &Catalog, query: &str, include_category: bool) -> Vec<Service> {
    let needle = query.to_lowercase();
    catalog
        .services
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle)
                || s.description.to_lowercase().contains(&needle)
                || (include_category && s.category.as_str().to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Plain category browsing, outside the search cascade.
pub fn browse_category(catalog: &Catalog, category: Category) -> SearchOutcome {
    SearchOutcome {
        tier: SearchTier::Category,
        services: catalog.services_in(category),
        message: None,
    }
}
