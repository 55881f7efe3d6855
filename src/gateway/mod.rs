pub mod memory;
pub mod rest;
pub mod sqlite;
pub mod wire;

use async_trait::async_trait;

use crate::models::{Account, Booking, BookingPatch, Registration};

pub use wire::SchemaError;

/// Storage for the three record kinds the marketplace persists.
///
/// Every call is a suspending operation that may fail on its own; callers
/// must not assume anything about ordering relative to their other state.
/// Listings are returned newest first.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert `booking` and return it as stored, with its generated id.
    async fn create_booking(&self, booking: &Booking) -> anyhow::Result<Booking>;

    async fn list_bookings(&self) -> anyhow::Result<Vec<Booking>>;

    /// Returns `false` when no booking has that id.
    async fn update_booking(&self, id: &str, patch: &BookingPatch) -> anyhow::Result<bool>;

    async fn create_registration(&self, reg: &Registration) -> anyhow::Result<Registration>;

    async fn list_registrations(&self) -> anyhow::Result<Vec<Registration>>;

    async fn create_user(&self, account: &Account) -> anyhow::Result<Account>;

    async fn list_users(&self) -> anyhow::Result<Vec<Account>>;

    /// Returns `false` when no user has that username.
    async fn delete_user(&self, username: &str) -> anyhow::Result<bool>;
}
