use async_trait::async_trait;
use serde_json::json;

use crate::catalog::Catalog;
use crate::models::Recommendation;
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are the assistant of a home services app called "Service on Call". A customer describes a problem in their own words; you map it onto the services we offer.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "recommendedCategory": "one of the available categories, copied exactly",
  "reasoning": "one brief, friendly sentence for the customer",
  "suggestedServiceIds": ["ids of matching services from the list"]
}

Rules:
- Only use service ids that appear in the available services list.
- If no specific service fits, return an empty suggestedServiceIds array.
- If the request is vague, guess the most likely category based on common home issues.
"#;

/// Turns a free-text problem description into a structured suggestion.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(&self, query: &str, catalog: &Catalog) -> anyhow::Result<Recommendation>;
}

pub struct LlmRecommender {
    llm: Box<dyn LlmProvider>,
}

impl LlmRecommender {
    pub fn new(llm: Box<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RecommendationService for LlmRecommender {
    async fn recommend(&self, query: &str, catalog: &Catalog) -> anyhow::Result<Recommendation> {
        let context = json!({
            "availableServices": catalog.summaries(),
            "availableCategories": catalog.categories(),
        });
        let prompt = format!("User query: {query:?}\n\nCatalog:\n{context}");

        let response = self.llm.chat(SYSTEM_PROMPT, &[Message::user(prompt)]).await?;

        parse_recommendation(&response)
    }
}

fn parse_recommendation(response: &str) -> anyhow::Result<Recommendation> {
    let parsed = try_parse(response).ok_or_else(|| {
        tracing::warn!("LLM response is not a valid recommendation");
        anyhow::anyhow!("malformed recommendation response: {response}")
    })?;

    Ok(normalize(parsed))
}

fn try_parse(response: &str) -> Option<Recommendation> {
    if let Ok(rec) = serde_json::from_str::<Recommendation>(response) {
        return Some(rec);
    }

    // Strip markdown code fences
    let trimmed = response.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(rec) = serde_json::from_str::<Recommendation>(cleaned) {
        return Some(rec);
    }

    // Outermost object embedded in prose
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Recommendation>(&cleaned[start..=end]).ok()
}

fn normalize(mut rec: Recommendation) -> Recommendation {
    rec.suggested_service_ids = rec
        .suggested_service_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    rec.recommended_category = rec
        .recommended_category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    rec
}
