use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use super::wire::{self, BookingInsert, BookingUpdate, RegistrationInsert, UserRow};
use super::PersistenceGateway;
use crate::db::{self, queries};
use crate::models::{Account, Booking, BookingPatch, Registration};

/// Relational store backed by a local SQLite file.
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
    numeric_ids: bool,
}

impl SqliteGateway {
    pub fn open(path: &str, numeric_ids: bool) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self::new(conn, numeric_ids))
    }

    pub fn new(conn: Connection, numeric_ids: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            numeric_ids,
        }
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn create_booking(&self, booking: &Booking) -> anyhow::Result<Booking> {
        let insert = BookingInsert::from_booking(booking, self.numeric_ids)?;
        let row = {
            let conn = self.conn()?;
            queries::insert_booking(&conn, &insert).context("failed to insert booking")?
        };
        Ok(Booking::try_from(row)?)
    }

    async fn list_bookings(&self) -> anyhow::Result<Vec<Booking>> {
        let rows = {
            let conn = self.conn()?;
            queries::list_bookings(&conn).context("failed to list bookings")?
        };
        Ok(wire::convert_rows("booking", rows))
    }

    async fn update_booking(&self, id: &str, patch: &BookingPatch) -> anyhow::Result<bool> {
        // Rowids are integers; anything else can't name a stored booking.
        let Ok(id) = id.parse::<i64>() else {
            return Ok(false);
        };
        let conn = self.conn()?;
        queries::update_booking(&conn, id, &BookingUpdate::from(patch))
            .context("failed to update booking")
    }

    async fn create_registration(&self, reg: &Registration) -> anyhow::Result<Registration> {
        let insert = RegistrationInsert::from_registration(reg)?;
        let conn = self.conn()?;
        let row = queries::insert_registration(&conn, &insert)
            .context("failed to insert registration")?;
        Ok(Registration::from(row))
    }

    async fn list_registrations(&self) -> anyhow::Result<Vec<Registration>> {
        let conn = self.conn()?;
        let rows = queries::list_registrations(&conn).context("failed to list registrations")?;
        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn create_user(&self, account: &Account) -> anyhow::Result<Account> {
        let conn = self.conn()?;
        queries::insert_user(&conn, &UserRow::from(account))
            .with_context(|| format!("failed to insert user {}", account.username))?;
        Ok(account.clone())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<Account>> {
        let rows = {
            let conn = self.conn()?;
            queries::list_users(&conn).context("failed to list users")?
        };
        Ok(wire::convert_rows("user", rows))
    }

    async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::delete_user(&conn, username).context("failed to delete user")
    }
}
