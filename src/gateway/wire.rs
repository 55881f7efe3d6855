//! Row shapes exchanged with relational stores.
//!
//! Domain records use camelCase names and loose string ids; store columns are
//! snake_case and may enforce numeric types. Every record is converted into
//! one of these structs before it leaves the process, so type mismatches are
//! caught here instead of at the remote end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Account, Booking, BookingPatch, BookingStatus, Category, Registration, Role};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("{field} must be numeric, got {value:?}")]
    NonNumeric { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("price must not be negative, got {0}")]
    NegativePrice(i64),

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("unknown booking status: {0:?}")]
    UnknownStatus(String),

    #[error("unknown role: {0:?}")]
    UnknownRole(String),
}

/// An identifier or free-form value that a store may hand back as either a
/// JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl WireValue {
    /// Coerce `raw` for a column that may be declared numeric.
    pub fn coerce(field: &'static str, raw: &str, numeric: bool) -> Result<Self, SchemaError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SchemaError::Empty(field));
        }
        if !numeric {
            return Ok(WireValue::Text(raw.to_string()));
        }
        raw.parse::<i64>()
            .map(WireValue::Int)
            .map_err(|_| SchemaError::NonNumeric {
                field,
                value: raw.to_string(),
            })
    }

    pub fn into_string(self) -> String {
        match self {
            WireValue::Int(n) => n.to_string(),
            WireValue::Float(f) => f.to_string(),
            WireValue::Text(s) => s,
        }
    }
}

// ── Bookings ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingInsert {
    pub service_id: WireValue,
    pub service_name: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub price: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingInsert {
    pub fn from_booking(b: &Booking, numeric_ids: bool) -> Result<Self, SchemaError> {
        if b.price < 0 {
            return Err(SchemaError::NegativePrice(b.price));
        }
        for (field, value) in [
            ("serviceName", &b.service_name),
            ("customerName", &b.customer_name),
            ("customerPhone", &b.customer_phone),
            ("address", &b.address),
        ] {
            if value.trim().is_empty() {
                return Err(SchemaError::Empty(field));
            }
        }

        Ok(Self {
            service_id: WireValue::coerce("serviceId", &b.service_id, numeric_ids)?,
            service_name: b.service_name.clone(),
            category: b.category.as_str().to_string(),
            date: b.date.clone(),
            time: b.time.clone(),
            address: b.address.clone(),
            customer_name: b.customer_name.clone(),
            customer_phone: b.customer_phone.clone(),
            price: b.price,
            status: b.status.as_str().to_string(),
            provider_id: b.provider_id.clone(),
            created_at: b.created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRow {
    pub id: WireValue,
    pub service_id: WireValue,
    pub service_name: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub price: f64,
    pub status: String,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = SchemaError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let category =
            Category::parse(&row.category).ok_or(SchemaError::UnknownCategory(row.category))?;
        let status =
            BookingStatus::parse(&row.status).ok_or(SchemaError::UnknownStatus(row.status))?;

        Ok(Booking {
            id: Some(row.id.into_string()),
            service_id: row.service_id.into_string(),
            service_name: row.service_name,
            category,
            date: row.date,
            time: row.time,
            address: row.address,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            price: row.price.round() as i64,
            status,
            provider_id: row.provider_id.filter(|p| !p.is_empty()),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl From<&BookingPatch> for BookingUpdate {
    fn from(patch: &BookingPatch) -> Self {
        Self {
            status: patch.status.map(|s| s.as_str().to_string()),
            provider_id: patch.provider_id.clone(),
        }
    }
}

// ── Registrations ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationInsert {
    pub full_name: String,
    pub phone: String,
    pub category: String,
    pub experience: String,
    pub city: String,
    pub submitted_at: DateTime<Utc>,
}

impl RegistrationInsert {
    pub fn from_registration(r: &Registration) -> Result<Self, SchemaError> {
        for (field, value) in [
            ("fullName", &r.full_name),
            ("phone", &r.phone),
            ("city", &r.city),
        ] {
            if value.trim().is_empty() {
                return Err(SchemaError::Empty(field));
            }
        }

        Ok(Self {
            full_name: r.full_name.clone(),
            phone: r.phone.clone(),
            category: r.category.clone(),
            experience: r.experience.clone(),
            city: r.city.clone(),
            submitted_at: r.submitted_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRow {
    pub id: WireValue,
    pub full_name: String,
    pub phone: String,
    pub category: String,
    pub experience: WireValue,
    pub city: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Registration {
            id: Some(row.id.into_string()),
            full_name: row.full_name,
            phone: row.phone,
            category: row.category,
            experience: row.experience.into_string(),
            city: row.city,
            submitted_at: row.submitted_at,
        }
    }
}

// ── Users ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub username: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<&Account> for UserRow {
    fn from(a: &Account) -> Self {
        Self {
            username: a.username.clone(),
            name: a.name.clone(),
            role: a.role.as_str().to_string(),
            category: a.category.map(|c| c.as_str().to_string()),
        }
    }
}

impl TryFrom<UserRow> for Account {
    type Error = SchemaError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or(SchemaError::UnknownRole(row.role))?;
        let category = match row.category.filter(|c| !c.is_empty()) {
            Some(c) => Some(Category::parse(&c).ok_or(SchemaError::UnknownCategory(c))?),
            None => None,
        };

        Ok(Account {
            username: row.username,
            name: row.name,
            role,
            category,
        })
    }
}

/// Convert fetched rows, dropping (and logging) any that don't fit the schema
/// rather than failing the whole listing.
pub fn convert_rows<R, T>(kind: &str, rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = SchemaError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(kind, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBooking;

    fn booking(service_id: &str) -> Booking {
        let service = crate::models::Service {
            id: service_id.to_string(),
            name: "Tap Repair".to_string(),
            description: String::new(),
            price: 149,
            rating: 4.6,
            reviews: 560,
            image: String::new(),
            category: Category::Plumbing,
            duration: "30 mins".to_string(),
        };
        let req = NewBooking {
            service_id: service_id.to_string(),
            date: "2025-06-16".to_string(),
            time: "11:00".to_string(),
            address: "Sector 13".to_string(),
            customer_name: "Amit".to_string(),
            customer_phone: "9876543210".to_string(),
        };
        Booking::pending(&service, &req, Utc::now())
    }

    #[test]
    fn test_insert_uses_snake_case_columns() {
        let insert = BookingInsert::from_booking(&booking("3"), false).unwrap();
        let json = serde_json::to_value(&insert).unwrap();
        assert_eq!(json["service_id"], "3");
        assert_eq!(json["customer_name"], "Amit");
        assert_eq!(json["customer_phone"], "9876543210");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["price"], 149);
        assert!(json.get("provider_id").is_none());
        assert!(json.get("serviceId").is_none());
    }

    #[test]
    fn test_numeric_service_id_coerced() {
        let insert = BookingInsert::from_booking(&booking("3"), true).unwrap();
        let json = serde_json::to_value(&insert).unwrap();
        assert_eq!(json["service_id"], 3);
    }

    #[test]
    fn test_non_numeric_service_id_rejected_when_numeric() {
        let err = BookingInsert::from_booking(&booking("w1"), true).unwrap_err();
        assert!(matches!(err, SchemaError::NonNumeric { field: "serviceId", .. }));
    }

    #[test]
    fn test_row_with_numeric_id_converts() {
        let row: BookingRow = serde_json::from_value(serde_json::json!({
            "id": 42,
            "service_id": 3,
            "service_name": "Tap Repair",
            "category": "Plumbing",
            "date": "2025-06-16",
            "time": "11:00",
            "address": "Sector 13",
            "customer_name": "Amit",
            "customer_phone": "9876543210",
            "price": 149.0,
            "status": "ASSIGNED",
            "provider_id": "plumber1",
            "created_at": "2025-06-01T10:00:00.123456+00:00"
        }))
        .unwrap();

        let b = Booking::try_from(row).unwrap();
        assert_eq!(b.id.as_deref(), Some("42"));
        assert_eq!(b.service_id, "3");
        assert_eq!(b.price, 149);
        assert_eq!(b.status, BookingStatus::Assigned);
        assert_eq!(b.provider_id.as_deref(), Some("plumber1"));
    }

    #[test]
    fn test_row_with_unknown_status_rejected() {
        let row: BookingRow = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "service_id": "3",
            "service_name": "Tap Repair",
            "category": "Plumbing",
            "date": "",
            "time": "",
            "address": "",
            "customer_name": "",
            "customer_phone": "",
            "price": 149,
            "status": "DONE",
            "provider_id": null,
            "created_at": "2025-06-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            Booking::try_from(row).unwrap_err(),
            SchemaError::UnknownStatus("DONE".to_string())
        );
    }

    #[test]
    fn test_update_only_sends_set_fields() {
        let update = BookingUpdate::from(&BookingPatch::status(BookingStatus::Completed));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"status": "COMPLETED"}));
    }

    #[test]
    fn test_registration_experience_accepts_number() {
        let row: RegistrationRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "full_name": "Karan Mehra",
            "phone": "9000012345",
            "category": "Painting & Renovation",
            "experience": 10,
            "city": "Karnal",
            "submitted_at": "2025-06-01T10:00:00Z"
        }))
        .unwrap();
        let reg = Registration::from(row);
        assert_eq!(reg.id.as_deref(), Some("7"));
        assert_eq!(reg.experience, "10");
    }

    #[test]
    fn test_user_row_rejects_unknown_category() {
        let row = UserRow {
            username: "x".to_string(),
            name: "X".to_string(),
            role: "PROVIDER".to_string(),
            category: Some("Astrology".to_string()),
        };
        assert!(matches!(
            Account::try_from(row),
            Err(SchemaError::UnknownCategory(_))
        ));
    }
}
