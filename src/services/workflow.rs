use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::gateway::PersistenceGateway;
use crate::models::{
    Account, Booking, BookingPatch, BookingStatus, Category, NewBooking, NewRegistration,
    Registration, Role,
};

/// Locally cached copy of the store, replaced wholesale on every refresh.
#[derive(Debug, Clone, Default)]
pub struct LocalView {
    pub bookings: Vec<Booking>,
    pub registrations: Vec<Registration>,
    pub users: Vec<Account>,
}

/// A booking as a provider sees it. Customer details stay hidden until the
/// provider has claimed the job.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBooking {
    pub id: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub category: Category,
    pub date: String,
    pub time: String,
    pub price: i64,
    pub status: BookingStatus,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub customer: Option<CustomerContact>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub providers: usize,
    pub registrations: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub available: usize,
    pub my_jobs: usize,
}

/// Bookings visible to `provider`: open work in their trade plus jobs they
/// have claimed themselves.
pub fn provider_view(bookings: &[Booking], provider: &Account) -> Vec<ProviderBooking> {
    let Some(category) = provider.category else {
        return vec![];
    };

    bookings
        .iter()
        .filter(|b| b.category == category)
        .filter(|b| b.status == BookingStatus::Pending || b.is_claimed_by(&provider.username))
        .map(|b| ProviderBooking {
            id: b.id.clone(),
            service_id: b.service_id.clone(),
            service_name: b.service_name.clone(),
            category: b.category,
            date: b.date.clone(),
            time: b.time.clone(),
            price: b.price,
            status: b.status,
            provider_id: b.provider_id.clone(),
            created_at: b.created_at,
            customer: b.is_claimed_by(&provider.username).then(|| CustomerContact {
                name: b.customer_name.clone(),
                phone: b.customer_phone.clone(),
                address: b.address.clone(),
            }),
        })
        .collect()
}

/// Releases its key when the guarded action resolves, however it resolves.
struct InFlight<'a> {
    keys: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(&self.key);
    }
}

/// Mediates every change to bookings, registrations and accounts.
///
/// Mutations are applied optimistically to the local view, sent to the
/// gateway, and then reconciled by re-fetching everything. Between the
/// optimistic write and the re-fetch the local view may disagree with the
/// store; afterwards it equals the store.
pub struct BookingWorkflow {
    gateway: Arc<dyn PersistenceGateway>,
    view: RwLock<LocalView>,
    in_flight: Mutex<HashSet<String>>,
}

impl BookingWorkflow {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            view: RwLock::new(LocalView::default()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn begin(&self, key: String) -> Result<InFlight<'_>, AppError> {
        let mut keys = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.clone()) {
            tracing::warn!(key = %key, "rejecting duplicate in-flight request");
            return Err(AppError::InProgress(key));
        }
        Ok(InFlight {
            keys: &self.in_flight,
            key,
        })
    }

    // ── Reconciliation ──

    /// Replace the local view with a fresh listing of every record kind.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let (bookings, registrations, users) = tokio::try_join!(
            self.gateway.list_bookings(),
            self.gateway.list_registrations(),
            self.gateway.list_users(),
        )?;

        tracing::debug!(
            bookings = bookings.len(),
            registrations = registrations.len(),
            users = users.len(),
            "local view refreshed"
        );

        *self.view.write().await = LocalView {
            bookings,
            registrations,
            users,
        };
        Ok(())
    }

    /// Refresh after a mutation. A failed re-fetch leaves the previous view
    /// in place; the next successful one corrects it. Returns whether the
    /// view now reflects the store.
    async fn reconcile(&self) -> bool {
        match self.refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "reconciliation re-fetch failed");
                false
            }
        }
    }

    pub async fn snapshot(&self) -> LocalView {
        self.view.read().await.clone()
    }

    pub async fn account(&self, username: &str) -> Option<Account> {
        self.view
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn find_booking(&self, id: &str) -> Option<Booking> {
        self.view
            .read()
            .await
            .bookings
            .iter()
            .find(|b| b.id.as_deref() == Some(id))
            .cloned()
    }

    /// Local lookup, falling back to one re-fetch for bookings created
    /// elsewhere since the last refresh.
    async fn load_booking(&self, id: &str) -> Result<Booking, AppError> {
        if let Some(booking) = self.find_booking(id).await {
            return Ok(booking);
        }
        self.refresh().await?;
        self.find_booking(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
    }

    /// Like [`Self::load_booking`], for accounts added since the last refresh.
    async fn load_account(&self, username: &str) -> Result<Option<Account>, AppError> {
        if let Some(account) = self.account(username).await {
            return Ok(Some(account));
        }
        self.refresh().await?;
        Ok(self.account(username).await)
    }

    // ── Bookings ──

    pub async fn create_booking(
        &self,
        catalog: &Catalog,
        req: NewBooking,
    ) -> Result<Booking, AppError> {
        for (field, value) in [
            ("date", &req.date),
            ("time", &req.time),
            ("address", &req.address),
            ("customerName", &req.customer_name),
            ("customerPhone", &req.customer_phone),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        let service = catalog
            .service(req.service_id.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown service: {}", req.service_id)))?;

        let _guard = self.begin(format!(
            "create:{}:{}:{}:{}",
            service.id,
            req.customer_phone.trim(),
            req.date.trim(),
            req.time.trim()
        ))?;

        let booking = Booking::pending(service, &req, Utc::now());
        self.view.write().await.bookings.insert(0, booking.clone());

        let result = self.gateway.create_booking(&booking).await;
        self.reconcile().await;

        match result {
            Ok(stored) => {
                tracing::info!(
                    id = stored.id.as_deref().unwrap_or_default(),
                    service = %stored.service_id,
                    category = %stored.category,
                    "booking created"
                );
                Ok(stored)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to persist booking");
                Err(e.into())
            }
        }
    }

    /// A provider (or admin) claims an open booking for themselves.
    pub async fn accept_booking(&self, id: &str, actor: &Account) -> Result<Booking, AppError> {
        if actor.role == Role::User {
            return Err(AppError::Forbidden("only providers can accept bookings".into()));
        }

        let _guard = self.begin(format!("booking:{id}"))?;
        let booking = self.load_booking(id).await?;

        if !actor.serves(booking.category) {
            return Err(AppError::Forbidden(format!(
                "{} does not serve {}",
                actor.username, booking.category
            )));
        }

        match booking.status {
            BookingStatus::Pending => {}
            BookingStatus::Assigned if booking.is_claimed_by(&actor.username) => {
                return Ok(booking);
            }
            BookingStatus::Assigned => {
                return Err(AppError::Conflict(format!(
                    "booking {id} is already assigned"
                )));
            }
            status => {
                return Err(AppError::Conflict(format!(
                    "booking {id} is {}",
                    status.as_str()
                )));
            }
        }

        self.apply_patch(booking, BookingPatch::assign(&actor.username))
            .await
    }

    /// Admin hands a booking to a provider. Overwrites any earlier
    /// assignment; the last write wins.
    pub async fn assign_booking(
        &self,
        id: &str,
        provider_username: &str,
        actor: &Account,
    ) -> Result<Booking, AppError> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("only admins can assign bookings".into()));
        }

        let _guard = self.begin(format!("booking:{id}"))?;
        let booking = self.load_booking(id).await?;

        let provider = self
            .load_account(provider_username)
            .await?
            .filter(|a| a.role == Role::Provider)
            .ok_or_else(|| AppError::NotFound(format!("provider {provider_username}")))?;

        if !provider.serves(booking.category) {
            return Err(AppError::Validation(format!(
                "{} does not serve {}",
                provider.username, booking.category
            )));
        }

        self.apply_patch(booking, BookingPatch::assign(&provider.username))
            .await
    }

    /// The assigned provider (or an admin) closes out a job.
    pub async fn complete_booking(&self, id: &str, actor: &Account) -> Result<Booking, AppError> {
        let _guard = self.begin(format!("booking:{id}"))?;
        let booking = self.load_booking(id).await?;

        if !actor.is_admin() && !booking.is_claimed_by(&actor.username) {
            return Err(AppError::Forbidden(format!(
                "booking {id} is not assigned to {}",
                actor.username
            )));
        }
        if booking.status != BookingStatus::Assigned {
            return Err(AppError::Conflict(format!(
                "booking {id} is {}",
                booking.status.as_str()
            )));
        }

        self.apply_patch(booking, BookingPatch::status(BookingStatus::Completed))
            .await
    }

    pub async fn cancel_booking(&self, id: &str, actor: &Account) -> Result<Booking, AppError> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("only admins can cancel bookings".into()));
        }

        let _guard = self.begin(format!("booking:{id}"))?;
        let booking = self.load_booking(id).await?;

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Assigned
        ) {
            return Err(AppError::Conflict(format!(
                "booking {id} is {}",
                booking.status.as_str()
            )));
        }

        self.apply_patch(booking, BookingPatch::status(BookingStatus::Cancelled))
            .await
    }

    /// Persist `patch`, then re-fetch. Update failures go to the caller
    /// unretried.
    async fn apply_patch(&self, mut booking: Booking, patch: BookingPatch) -> Result<Booking, AppError> {
        let id = booking.id.clone().unwrap_or_default();

        let updated = self.gateway.update_booking(&id, &patch).await;
        let reconciled = self.reconcile().await;

        let found = match updated {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(id = %id, error = %format!("{e:#}"), "failed to update booking");
                return Err(e.into());
            }
        };
        if !found {
            return Err(AppError::NotFound(format!("booking {id}")));
        }

        tracing::info!(
            id = %id,
            status = patch.status.map(|s| s.as_str()).unwrap_or_default(),
            provider = patch.provider_id.as_deref().unwrap_or_default(),
            "booking updated"
        );

        // A stale view still holds the pre-update copy.
        if reconciled {
            if let Some(fresh) = self.find_booking(&id).await {
                return Ok(fresh);
            }
        }
        booking.apply(&patch);
        Ok(booking)
    }

    pub async fn bookings_for_provider(&self, provider: &Account) -> Vec<ProviderBooking> {
        provider_view(&self.view.read().await.bookings, provider)
    }

    pub async fn bookings_for_admin(&self) -> Vec<Booking> {
        self.view.read().await.bookings.clone()
    }

    // ── Registrations ──

    pub async fn submit_registration(
        &self,
        req: NewRegistration,
    ) -> Result<Registration, AppError> {
        for (field, value) in [
            ("fullName", &req.full_name),
            ("phone", &req.phone),
            ("category", &req.category),
            ("city", &req.city),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        let _guard = self.begin(format!("registration:{}", req.phone.trim()))?;

        let reg = Registration::submitted(&req, Utc::now());
        self.view.write().await.registrations.insert(0, reg.clone());

        let result = self.gateway.create_registration(&reg).await;
        self.reconcile().await;

        let stored = result?;
        tracing::info!(
            id = stored.id.as_deref().unwrap_or_default(),
            category = %stored.category,
            "registration submitted"
        );
        Ok(stored)
    }

    pub async fn registrations(&self) -> Vec<Registration> {
        self.view.read().await.registrations.clone()
    }

    // ── Accounts ──

    pub async fn users(&self) -> Vec<Account> {
        self.view.read().await.users.clone()
    }

    pub async fn add_user(&self, actor: &Account, mut account: Account) -> Result<Account, AppError> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("only admins can manage users".into()));
        }

        account.username = account.username.trim().to_string();
        account.name = account.name.trim().to_string();
        if account.username.is_empty() || account.username.contains(char::is_whitespace) {
            return Err(AppError::Validation("username must be a single word".into()));
        }
        if account.name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        match account.role {
            Role::Provider if account.category.is_none() => {
                return Err(AppError::Validation("providers need a category".into()));
            }
            Role::Provider => {}
            _ => account.category = None,
        }

        let _guard = self.begin(format!("user:{}", account.username))?;

        if self.account(&account.username).await.is_some() {
            return Err(AppError::Conflict(format!(
                "username {} is taken",
                account.username
            )));
        }

        self.view.write().await.users.push(account.clone());
        let result = self.gateway.create_user(&account).await;
        self.reconcile().await;

        let stored = result?;
        tracing::info!(username = %stored.username, role = stored.role.as_str(), "user added");
        Ok(stored)
    }

    pub async fn delete_user(&self, actor: &Account, username: &str) -> Result<(), AppError> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("only admins can manage users".into()));
        }

        let _guard = self.begin(format!("user:{username}"))?;

        let target = self
            .account(username)
            .await
            .ok_or_else(|| AppError::NotFound(format!("user {username}")))?;
        if target.is_admin() {
            return Err(AppError::Forbidden("admin accounts cannot be deleted".into()));
        }

        self.view
            .write()
            .await
            .users
            .retain(|u| u.username != username);
        let result = self.gateway.delete_user(username).await;
        self.reconcile().await;

        if !result? {
            return Err(AppError::NotFound(format!("user {username}")));
        }
        tracing::info!(username, "user deleted");
        Ok(())
    }

    // ── Dashboards ──

    pub async fn admin_stats(&self) -> AdminStats {
        let view = self.view.read().await;
        AdminStats {
            total_bookings: view.bookings.len(),
            pending_bookings: view
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Pending)
                .count(),
            providers: view.users.iter().filter(|u| u.role == Role::Provider).count(),
            registrations: view.registrations.len(),
        }
    }

    pub async fn provider_stats(&self, provider: &Account) -> ProviderStats {
        let visible = self.bookings_for_provider(provider).await;
        ProviderStats {
            available: visible
                .iter()
                .filter(|b| b.status == BookingStatus::Pending)
                .count(),
            my_jobs: visible
                .iter()
                .filter(|b| b.status == BookingStatus::Assigned)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::gateway::memory::InMemoryGateway;

    /// In-memory store with switchable failures and an optional pause inside
    /// `create_booking`.
    #[derive(Default)]
    struct Scripted {
        inner: InMemoryGateway,
        fail_writes: AtomicBool,
        fail_lists: AtomicBool,
        pause_create: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl Scripted {
        fn seeded() -> Self {
            Self {
                inner: InMemoryGateway::seeded(),
                ..Default::default()
            }
        }

        fn check_writes(&self) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset by peer");
            }
            Ok(())
        }

        fn check_lists(&self) -> anyhow::Result<()> {
            if self.fail_lists.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset by peer");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceGateway for Scripted {
        async fn create_booking(&self, booking: &Booking) -> anyhow::Result<Booking> {
            if let Some((started, release)) = &self.pause_create {
                started.notify_one();
                release.notified().await;
            }
            self.check_writes()?;
            self.inner.create_booking(booking).await
        }
        async fn list_bookings(&self) -> anyhow::Result<Vec<Booking>> {
            self.check_lists()?;
            self.inner.list_bookings().await
        }
        async fn update_booking(&self, id: &str, patch: &BookingPatch) -> anyhow::Result<bool> {
            self.check_writes()?;
            self.inner.update_booking(id, patch).await
        }
        async fn create_registration(&self, reg: &Registration) -> anyhow::Result<Registration> {
            self.check_writes()?;
            self.inner.create_registration(reg).await
        }
        async fn list_registrations(&self) -> anyhow::Result<Vec<Registration>> {
            self.check_lists()?;
            self.inner.list_registrations().await
        }
        async fn create_user(&self, account: &Account) -> anyhow::Result<Account> {
            self.check_writes()?;
            self.inner.create_user(account).await
        }
        async fn list_users(&self) -> anyhow::Result<Vec<Account>> {
            self.check_lists()?;
            self.inner.list_users().await
        }
        async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
            self.check_writes()?;
            self.inner.delete_user(username).await
        }
    }

    fn provider(username: &str, category: Category) -> Account {
        Account {
            username: username.to_string(),
            name: username.to_string(),
            role: Role::Provider,
            category: Some(category),
        }
    }

    fn admin() -> Account {
        Account {
            username: "admin".to_string(),
            name: "Super Admin".to_string(),
            role: Role::Admin,
            category: None,
        }
    }

    fn request(service_id: &str) -> NewBooking {
        NewBooking {
            service_id: service_id.to_string(),
            date: "2025-06-16".to_string(),
            time: "11:00 AM".to_string(),
            address: "House 12, Sector 7".to_string(),
            customer_name: "Priya".to_string(),
            customer_phone: "9811111111".to_string(),
        }
    }

    async fn setup() -> (Arc<Scripted>, BookingWorkflow, Catalog) {
        let gateway = Arc::new(Scripted::seeded());
        let workflow = BookingWorkflow::new(gateway.clone());
        workflow.refresh().await.unwrap();
        workflow
            .add_user(&admin(), provider("welder2", Category::Welding))
            .await
            .unwrap();
        (gateway, workflow, Catalog::builtin().unwrap())
    }

    #[tokio::test]
    async fn test_created_booking_is_pending_and_unassigned() {
        let (_, wf, catalog) = setup().await;
        let booking = wf.create_booking(&catalog, request("w2")).await.unwrap();

        assert!(booking.id.is_some());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.provider_id, None);
        assert_eq!(booking.price, 800);
        assert_eq!(booking.category, Category::Welding);
        assert_eq!(booking.service_name, "Shutter Fitting & Repair");

        let all = wf.bookings_for_admin().await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|b| b.id == booking.id));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_service_and_blank_fields() {
        let (_, wf, catalog) = setup().await;
        let err = wf.create_booking(&catalog, request("nope")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut blank = request("1");
        blank.address = "   ".to_string();
        let err = wf.create_booking(&catalog, blank).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(wf.bookings_for_admin().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_and_refetch_drops_optimistic_entry() {
        let (gateway, wf, catalog) = setup().await;
        gateway.fail_writes.store(true, Ordering::SeqCst);

        let err = wf.create_booking(&catalog, request("1")).await.unwrap_err();
        assert!(matches!(err, AppError::Gateway(_)));

        let all = wf.bookings_for_admin().await;
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|b| b.id.is_some()));
    }

    #[tokio::test]
    async fn test_optimistic_entry_visible_and_duplicate_rejected_while_in_flight() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gateway = Arc::new(Scripted {
            inner: InMemoryGateway::seeded(),
            pause_create: Some((started.clone(), release.clone())),
            ..Default::default()
        });
        let wf = BookingWorkflow::new(gateway);
        wf.refresh().await.unwrap();
        let catalog = Catalog::builtin().unwrap();

        let (first, (optimistic, duplicate)) = tokio::join!(
            wf.create_booking(&catalog, request("1")),
            async {
                started.notified().await;
                let snapshot = wf.snapshot().await;
                let duplicate = wf.create_booking(&catalog, request("1")).await;
                release.notify_one();
                (snapshot.bookings, duplicate)
            }
        );

        assert_eq!(optimistic.len(), 2);
        assert_eq!(optimistic[0].id, None);
        assert_eq!(optimistic[0].service_id, "1");
        assert!(matches!(duplicate, Err(AppError::InProgress(_))));

        let stored = first.unwrap();
        let all = wf.bookings_for_admin().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, stored.id);

        // Key released: the same request may be issued again.
        assert!(wf.create_booking(&catalog, request("1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_accept_assigns_to_acting_provider() {
        let (_, wf, _) = setup().await;
        let welder = wf.account("welder").await.unwrap();

        let booking = wf.accept_booking("B101", &welder).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Assigned);
        assert_eq!(booking.provider_id.as_deref(), Some("welder"));
        assert_eq!(booking.price, 450);
        assert_eq!(booking.category, Category::Welding);

        // Accepting again is a no-op for the same provider.
        let again = wf.accept_booking("B101", &welder).await.unwrap();
        assert_eq!(again.provider_id.as_deref(), Some("welder"));
    }

    #[tokio::test]
    async fn test_accept_outside_category_forbidden() {
        let (_, wf, _) = setup().await;
        let plumber = provider("plumber", Category::Plumbing);
        let err = wf.accept_booking("B101", &plumber).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_accept_claimed_by_other_conflicts() {
        let (_, wf, _) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        let welder2 = wf.account("welder2").await.unwrap();
        wf.accept_booking("B101", &welder).await.unwrap();

        let err = wf.accept_booking("B101", &welder2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_accept_unknown_booking_not_found() {
        let (_, wf, _) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        let err = wf.accept_booking("B999", &welder).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assign_last_write_wins() {
        let (_, wf, _) = setup().await;
        wf.assign_booking("B101", "welder", &admin()).await.unwrap();
        let booking = wf.assign_booking("B101", "welder2", &admin()).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Assigned);
        assert_eq!(booking.provider_id.as_deref(), Some("welder2"));
        let stored = &wf.bookings_for_admin().await[0];
        assert_eq!(stored.provider_id.as_deref(), Some("welder2"));
        assert_eq!(stored.price, 450);
    }

    #[tokio::test]
    async fn test_accept_returns_new_state_when_refetch_fails() {
        let (gateway, wf, _) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        gateway.fail_lists.store(true, Ordering::SeqCst);

        let booking = wf.accept_booking("B101", &welder).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Assigned);
        assert_eq!(booking.provider_id.as_deref(), Some("welder"));
        assert_eq!(booking.price, 450);

        let stored = gateway.inner.list_bookings().await.unwrap();
        assert_eq!(stored[0].status, BookingStatus::Assigned);
        assert_eq!(stored[0].provider_id.as_deref(), Some("welder"));
    }

    #[tokio::test]
    async fn test_assign_finds_provider_added_elsewhere() {
        let (gateway, wf, _) = setup().await;
        // Written straight to the store, bypassing this workflow's view.
        gateway
            .inner
            .create_user(&provider("welder3", Category::Welding))
            .await
            .unwrap();
        assert!(wf.account("welder3").await.is_none());

        let booking = wf.assign_booking("B101", "welder3", &admin()).await.unwrap();
        assert_eq!(booking.provider_id.as_deref(), Some("welder3"));
        assert_eq!(booking.status, BookingStatus::Assigned);
    }

    #[tokio::test]
    async fn test_assign_requires_admin_and_known_provider() {
        let (_, wf, _) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        let err = wf.assign_booking("B101", "welder2", &welder).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = wf.assign_booking("B101", "ghost", &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_failure_propagates() {
        let (gateway, wf, _) = setup().await;
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let err = wf.assign_booking("B101", "welder", &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::Gateway(_)));
        assert_eq!(wf.bookings_for_admin().await[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_provider_view_hides_other_claims_and_locks_contact() {
        let (_, wf, catalog) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        let welder2 = wf.account("welder2").await.unwrap();

        let second = wf.create_booking(&catalog, request("w2")).await.unwrap();
        wf.create_booking(&catalog, request("3")).await.unwrap();
        wf.accept_booking("B101", &welder).await.unwrap();

        let mine = wf.bookings_for_provider(&welder).await;
        assert_eq!(mine.len(), 2);
        for b in &mine {
            assert_eq!(b.category, Category::Welding);
            match b.status {
                BookingStatus::Pending => assert_eq!(b.customer, None),
                BookingStatus::Assigned => {
                    assert_eq!(b.provider_id.as_deref(), Some("welder"));
                    assert_eq!(b.customer.as_ref().unwrap().address, "Sector 13, Karnal");
                }
                other => panic!("unexpected status {other:?}"),
            }
        }

        let theirs = wf.bookings_for_provider(&welder2).await;
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].id, second.id);
        assert!(theirs
            .iter()
            .all(|b| b.status != BookingStatus::Assigned || b.provider_id.as_deref() == Some("welder2")));

        let stats = wf.provider_stats(&welder).await;
        assert_eq!(stats, ProviderStats { available: 1, my_jobs: 1 });
    }

    #[tokio::test]
    async fn test_complete_and_cancel() {
        let (_, wf, catalog) = setup().await;
        let welder = wf.account("welder").await.unwrap();
        let welder2 = wf.account("welder2").await.unwrap();

        let err = wf.complete_booking("B101", &welder).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        wf.accept_booking("B101", &welder).await.unwrap();
        let err = wf.complete_booking("B101", &welder2).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let done = wf.complete_booking("B101", &welder).await.unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(done.provider_id.as_deref(), Some("welder"));
        assert!(wf.bookings_for_provider(&welder).await.is_empty());

        let err = wf.cancel_booking("B101", &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let open = wf.create_booking(&catalog, request("w1")).await.unwrap();
        let id = open.id.unwrap();
        let err = wf.cancel_booking(&id, &welder).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let cancelled = wf.cancel_booking(&id, &admin()).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_view() {
        let (gateway, wf, _) = setup().await;
        gateway.fail_lists.store(true, Ordering::SeqCst);
        assert!(wf.refresh().await.is_err());
        assert_eq!(wf.bookings_for_admin().await.len(), 1);
        assert_eq!(wf.users().await.len(), 3);
    }

    #[tokio::test]
    async fn test_registration_submitted() {
        let (_, wf, _) = setup().await;
        let reg = wf
            .submit_registration(NewRegistration {
                full_name: "Ravi Kumar".to_string(),
                phone: "9000000001".to_string(),
                category: "Carpentry".to_string(),
                experience: "4".to_string(),
                city: "Karnal".to_string(),
            })
            .await
            .unwrap();
        assert!(reg.id.is_some());

        let regs = wf.registrations().await;
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0].full_name, "Ravi Kumar");
        assert_eq!(wf.admin_stats().await.registrations, 2);
    }

    #[tokio::test]
    async fn test_user_management() {
        let (_, wf, _) = setup().await;

        let err = wf
            .add_user(&admin(), provider("welder2", Category::Welding))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut no_category = provider("painter", Category::Painting);
        no_category.category = None;
        let err = wf.add_user(&admin(), no_category).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = wf.delete_user(&admin(), "admin").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        wf.delete_user(&admin(), "welder2").await.unwrap();
        assert!(wf.account("welder2").await.is_none());
        assert_eq!(wf.admin_stats().await.providers, 1);

        let err = wf.delete_user(&admin(), "welder2").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
