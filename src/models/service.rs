use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub rating: f32,
    pub reviews: u32,
    pub image: String,
    pub category: Category,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: String,
    pub name: String,
    pub rating: f32,
    pub bio: String,
    pub image: String,
    pub categories: Vec<Category>,
    pub completed_jobs: u32,
    pub experience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Testimonial {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub content: String,
    pub image: String,
}

/// The slice of a service the recommendation model gets to see.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub category: Category,
}

impl Service {
    pub fn summary(&self) -> ServiceSummary<'_> {
        ServiceSummary {
            id: &self.id,
            name: &self.name,
            description: &self.description,
            category: self.category,
        }
    }
}
