use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::wire::{
    self, BookingInsert, BookingRow, BookingUpdate, RegistrationInsert, RegistrationRow, UserRow,
};
use super::PersistenceGateway;
use crate::models::{Account, Booking, BookingPatch, Registration};

/// PostgREST-style remote store (Supabase and compatibles).
pub struct RestGateway {
    base_url: String,
    api_key: String,
    numeric_ids: bool,
    client: reqwest::Client,
}

impl RestGateway {
    pub fn new(
        base_url: String,
        api_key: String,
        numeric_ids: bool,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            base_url.starts_with("https://") || base_url.starts_with("http://"),
            "store url must be http(s): {base_url}"
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build store HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            numeric_ids,
            client,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned + Send>(&self, req: RequestBuilder, what: &str) -> anyhow::Result<T> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("failed to call store ({what})"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("store error ({what}, {status}): {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("failed to parse store response ({what})"))
    }

    async fn insert<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        table: &str,
        body: &B,
    ) -> anyhow::Result<R> {
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[body]);
        let mut rows: Vec<R> = self.send(req, table).await?;
        anyhow::ensure!(!rows.is_empty(), "store returned no row for insert into {table}");
        Ok(rows.swap_remove(0))
    }

    async fn select<R: DeserializeOwned + Send>(&self, table: &str, order: &str) -> anyhow::Result<Vec<R>> {
        let req = self
            .request(Method::GET, table)
            .query(&[("select", "*"), ("order", order)]);
        self.send(req, table).await
    }
}

/// PostgREST `eq` filter value, before URL encoding. Values with reserved
/// characters become a double-quoted literal with `"` and `\` backslash-escaped.
fn eq_filter(value: &str) -> String {
    let reserved =
        |c: char| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\') || c.is_whitespace();
    if !value.contains(reserved) {
        return format!("eq.{value}");
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("eq.\"{quoted}\"")
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    async fn create_booking(&self, booking: &Booking) -> anyhow::Result<Booking> {
        let insert = BookingInsert::from_booking(booking, self.numeric_ids)?;
        let row: BookingRow = self.insert("bookings", &insert).await?;
        Ok(Booking::try_from(row)?)
    }

    async fn list_bookings(&self) -> anyhow::Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = self.select("bookings", "created_at.desc").await?;
        Ok(wire::convert_rows("booking", rows))
    }

    async fn update_booking(&self, id: &str, patch: &BookingPatch) -> anyhow::Result<bool> {
        let id = wire::WireValue::coerce("id", id, self.numeric_ids)?.into_string();
        let req = self
            .request(Method::PATCH, "bookings")
            .query(&[("id", eq_filter(&id))])
            .header("Prefer", "return=representation")
            .json(&BookingUpdate::from(patch));
        let rows: Vec<serde_json::Value> = self.send(req, "bookings").await?;
        Ok(!rows.is_empty())
    }

    async fn create_registration(&self, reg: &Registration) -> anyhow::Result<Registration> {
        let insert = RegistrationInsert::from_registration(reg)?;
        let row: RegistrationRow = self.insert("registrations", &insert).await?;
        Ok(Registration::from(row))
    }

    async fn list_registrations(&self) -> anyhow::Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = self.select("registrations", "submitted_at.desc").await?;
        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn create_user(&self, account: &Account) -> anyhow::Result<Account> {
        let row: UserRow = self.insert("users", &UserRow::from(account)).await?;
        Ok(Account::try_from(row)?)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<Account>> {
        let rows: Vec<UserRow> = self.select("users", "username.asc").await?;
        Ok(wire::convert_rows("user", rows))
    }

    async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
        let req = self
            .request(Method::DELETE, "users")
            .query(&[("username", eq_filter(username))])
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self.send(req, "users").await?;
        Ok(!rows.is_empty())
    }
}
