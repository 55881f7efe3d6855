use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A professional's application to join. Write-once, no status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Option<String>,
    pub full_name: String,
    pub phone: String,
    /// Kept as free text: applicants may name a trade we don't list yet.
    pub category: String,
    pub experience: String,
    pub city: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub full_name: String,
    pub phone: String,
    pub category: String,
    pub experience: String,
    pub city: String,
}

impl Registration {
    pub fn submitted(req: &NewRegistration, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            full_name: req.full_name.trim().to_string(),
            phone: req.phone.trim().to_string(),
            category: req.category.trim().to_string(),
            experience: req.experience.trim().to_string(),
            city: req.city.trim().to_string(),
            submitted_at: now,
        }
    }
}
