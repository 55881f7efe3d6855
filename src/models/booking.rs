use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Service};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Assigned by the store on insert; `None` only for optimistic local copies.
    pub id: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub category: Category,
    pub date: String,
    pub time: String,
    pub address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub price: i64,
    pub status: BookingStatus,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Assigned => "ASSIGNED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "ASSIGNED" => Some(BookingStatus::Assigned),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Customer-supplied fields of a booking request. Everything else is derived
/// from the catalog service or set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub service_id: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub customer_name: String,
    pub customer_phone: String,
}

/// Partial update sent to the store. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub provider_id: Option<String>,
}

impl BookingPatch {
    pub fn assign(provider: &str) -> Self {
        Self {
            status: Some(BookingStatus::Assigned),
            provider_id: Some(provider.to_string()),
        }
    }

    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            provider_id: None,
        }
    }
}

impl Booking {
    /// A fresh, not yet persisted booking for `service`.
    pub fn pending(service: &Service, req: &NewBooking, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            category: service.category,
            date: req.date.trim().to_string(),
            time: req.time.trim().to_string(),
            address: req.address.trim().to_string(),
            customer_name: req.customer_name.trim().to_string(),
            customer_phone: req.customer_phone.trim().to_string(),
            price: service.price,
            status: BookingStatus::Pending,
            provider_id: None,
            created_at: now,
        }
    }

    pub fn is_claimed_by(&self, username: &str) -> bool {
        self.status == BookingStatus::Assigned && self.provider_id.as_deref() == Some(username)
    }

    /// Apply a patch the way the store does. Category and price never change.
    pub fn apply(&mut self, patch: &BookingPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(provider) = &patch.provider_id {
            self.provider_id = Some(provider.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service {
            id: "3".to_string(),
            name: "Tap Repair".to_string(),
            description: "Repair of leaking taps or installation of new ones.".to_string(),
            price: 149,
            rating: 4.6,
            reviews: 560,
            image: String::new(),
            category: Category::Plumbing,
            duration: "30 mins".to_string(),
        }
    }

    fn request() -> NewBooking {
        NewBooking {
            service_id: "3".to_string(),
            date: "2025-06-16".to_string(),
            time: " 11:00 AM ".to_string(),
            address: "Sector 13, Karnal".to_string(),
            customer_name: "Amit Singh".to_string(),
            customer_phone: "9876543210".to_string(),
        }
    }

    #[test]
    fn test_pending_copies_service_fields() {
        let b = Booking::pending(&service(), &request(), Utc::now());
        assert_eq!(b.id, None);
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.provider_id, None);
        assert_eq!(b.price, 149);
        assert_eq!(b.category, Category::Plumbing);
        assert_eq!(b.service_name, "Tap Repair");
        assert_eq!(b.time, "11:00 AM");
    }

    #[test]
    fn test_apply_assign_keeps_category_and_price() {
        let mut b = Booking::pending(&service(), &request(), Utc::now());
        b.apply(&BookingPatch::assign("plumber1"));
        assert_eq!(b.status, BookingStatus::Assigned);
        assert_eq!(b.provider_id.as_deref(), Some("plumber1"));
        assert_eq!(b.price, 149);
        assert_eq!(b.category, Category::Plumbing);
        assert!(b.is_claimed_by("plumber1"));
        assert!(!b.is_claimed_by("plumber2"));
    }

    #[test]
    fn test_status_patch_keeps_provider() {
        let mut b = Booking::pending(&service(), &request(), Utc::now());
        b.apply(&BookingPatch::assign("plumber1"));
        b.apply(&BookingPatch::status(BookingStatus::Completed));
        assert_eq!(b.status, BookingStatus::Completed);
        assert_eq!(b.provider_id.as_deref(), Some("plumber1"));
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&BookingStatus::Assigned).unwrap();
        assert_eq!(json, "\"ASSIGNED\"");
        assert_eq!(BookingStatus::parse("CANCELLED"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("pending"), None);
    }
}
