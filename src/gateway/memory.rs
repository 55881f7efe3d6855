use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::PersistenceGateway;
use crate::models::{Account, Booking, BookingPatch, BookingStatus, Category, Registration, Role};

/// Process-local stand-in for the remote store. Used for demos and tests.
#[derive(Default)]
pub struct InMemoryGateway {
    bookings: Mutex<Vec<Booking>>,
    registrations: Mutex<Vec<Registration>>,
    users: Mutex<Vec<Account>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo data: one admin, one welder, one open welding job, one application.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let gateway = Self::new();

        *lock(&gateway.users) = vec![
            Account {
                username: "admin".to_string(),
                name: "Super Admin".to_string(),
                role: Role::Admin,
                category: None,
            },
            Account {
                username: "welder".to_string(),
                name: "Aslam Welder".to_string(),
                role: Role::Provider,
                category: Some(Category::Welding),
            },
        ];

        *lock(&gateway.bookings) = vec![Booking {
            id: Some("B101".to_string()),
            service_id: "w1".to_string(),
            service_name: "Main Gate & Window Welding".to_string(),
            category: Category::Welding,
            date: "2023-11-20".to_string(),
            time: "11:00 AM".to_string(),
            address: "Sector 13, Karnal".to_string(),
            customer_name: "Amit Singh".to_string(),
            customer_phone: "9876543210".to_string(),
            price: 450,
            status: BookingStatus::Pending,
            provider_id: None,
            created_at: now,
        }];

        *lock(&gateway.registrations) = vec![Registration {
            id: Some("R201".to_string()),
            full_name: "Karan Mehra".to_string(),
            phone: "9000012345".to_string(),
            category: Category::Painting.as_str().to_string(),
            experience: "10".to_string(),
            city: "Karnal".to_string(),
            submitted_at: now,
        }];

        gateway
    }
}

// Poisoning only follows a panic mid-update; the data is still usable.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_booking(&self, booking: &Booking) -> anyhow::Result<Booking> {
        let mut stored = booking.clone();
        stored.id = Some(Uuid::new_v4().to_string());
        lock(&self.bookings).insert(0, stored.clone());
        Ok(stored)
    }

    async fn list_bookings(&self) -> anyhow::Result<Vec<Booking>> {
        let mut bookings = lock(&self.bookings).clone();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn update_booking(&self, id: &str, patch: &BookingPatch) -> anyhow::Result<bool> {
        let mut bookings = lock(&self.bookings);
        match bookings.iter_mut().find(|b| b.id.as_deref() == Some(id)) {
            Some(booking) => {
                booking.apply(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_registration(&self, reg: &Registration) -> anyhow::Result<Registration> {
        let mut stored = reg.clone();
        stored.id = Some(Uuid::new_v4().to_string());
        lock(&self.registrations).insert(0, stored.clone());
        Ok(stored)
    }

    async fn list_registrations(&self) -> anyhow::Result<Vec<Registration>> {
        let mut regs = lock(&self.registrations).clone();
        regs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(regs)
    }

    async fn create_user(&self, account: &Account) -> anyhow::Result<Account> {
        let mut users = lock(&self.users);
        anyhow::ensure!(
            !users.iter().any(|u| u.username == account.username),
            "username already exists: {}",
            account.username
        );
        users.push(account.clone());
        Ok(account.clone())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<Account>> {
        Ok(lock(&self.users).clone())
    }

    async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
        let mut users = lock(&self.users);
        let before = users.len();
        users.retain(|u| u.username != username);
        Ok(users.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id_and_prepends() {
        let gateway = InMemoryGateway::seeded();
        let mut booking = gateway.list_bookings().await.unwrap()[0].clone();
        booking.id = None;
        booking.created_at = Utc::now() + chrono::Duration::seconds(5);

        let stored = gateway.create_booking(&booking).await.unwrap();
        assert!(stored.id.is_some());

        let all = gateway.list_bookings().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, stored.id);
    }

    #[tokio::test]
    async fn test_seeded_booking_matches_catalog_service() {
        let catalog = crate::catalog::Catalog::builtin().unwrap();
        let gateway = InMemoryGateway::seeded();
        for booking in gateway.list_bookings().await.unwrap() {
            let service = catalog.service(&booking.service_id).unwrap();
            assert_eq!(booking.service_name, service.name);
            assert_eq!(booking.category, service.category);
            assert_eq!(booking.price, service.price);
        }
    }

    #[tokio::test]
    async fn test_update_unknown_booking_reports_missing() {
        let gateway = InMemoryGateway::seeded();
        let updated = gateway
            .update_booking("nope", &BookingPatch::assign("welder"))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let gateway = InMemoryGateway::seeded();
        let admin = gateway.list_users().await.unwrap()[0].clone();
        assert!(gateway.create_user(&admin).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let gateway = InMemoryGateway::seeded();
        assert!(gateway.delete_user("welder").await.unwrap());
        assert!(!gateway.delete_user("welder").await.unwrap());
        assert_eq!(gateway.list_users().await.unwrap().len(), 1);
    }
}
