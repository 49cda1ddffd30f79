use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::waitlist::config::{CountScope, WaitlistConfig};
use crate::waitlist::domain::{EntryId, EntryPatch, NewEntry, WaitlistEntry};
use crate::waitlist::hooks::{HookError, WaitlistHooks};
use crate::waitlist::memory::InMemoryWaitlistStore;
use crate::waitlist::service::{Session, WaitlistService};
use crate::waitlist::store::{EntryFilter, Page, StoreError, WaitlistStore};

pub(super) fn admin() -> Session {
    Session::new("admin-1")
}

pub(super) fn renumbering_config() -> WaitlistConfig {
    WaitlistConfig {
        renumber_positions: true,
        ..WaitlistConfig::default()
    }
}

pub(super) type TestService = WaitlistService<InMemoryWaitlistStore, RecordingHooks>;

pub(super) fn build_service(
    config: WaitlistConfig,
) -> (TestService, Arc<InMemoryWaitlistStore>, Arc<RecordingHooks>) {
    let store = Arc::new(InMemoryWaitlistStore::new());
    let hooks = Arc::new(RecordingHooks::default());
    let service = WaitlistService::with_hooks(store.clone(), hooks.clone(), config)
        .expect("valid waitlist config");
    (service, store, hooks)
}

pub(super) async fn join_all(service: &TestService, emails: &[&str]) -> Vec<WaitlistEntry> {
    let mut entries = Vec::with_capacity(emails.len());
    for email in emails {
        entries.push(service.join(email, None).await.expect("join succeeds"));
    }
    entries
}

pub(super) fn stored_position(store: &InMemoryWaitlistStore, email: &str) -> u32 {
    store
        .snapshot()
        .expect("snapshot")
        .into_iter()
        .find(|entry| entry.email == email)
        .map(|entry| entry.position)
        .expect("entry present")
}

/// Records every callback and optionally fails one of them.
#[derive(Default)]
pub(super) struct RecordingHooks {
    events: Mutex<Vec<(&'static str, String)>>,
    fail_on: Option<&'static str>,
}

impl RecordingHooks {
    pub(super) fn failing(hook: &'static str) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_on: Some(hook),
        }
    }

    pub(super) fn events(&self) -> Vec<(&'static str, String)> {
        self.events.lock().expect("hook mutex poisoned").clone()
    }

    fn record(&self, hook: &'static str, entry: &WaitlistEntry) -> Result<(), HookError> {
        self.events
            .lock()
            .expect("hook mutex poisoned")
            .push((hook, entry.email.clone()));
        match self.fail_on {
            Some(failing) if failing == hook => Err(HookError::new(hook, "callback exploded")),
            _ => Ok(()),
        }
    }
}

impl WaitlistHooks for RecordingHooks {
    async fn on_join(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        self.record("join", entry)
    }

    async fn on_approve(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        self.record("approve", entry)
    }

    async fn on_reject(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        self.record("reject", entry)
    }

    async fn on_complete(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        self.record("complete", entry)
    }
}

pub(super) struct UnavailableStore;

impl WaitlistStore for UnavailableStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn find_many(
        &self,
        _filter: &EntryFilter,
        _page: Page,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn count(&self, _filter: &EntryFilter) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn create(
        &self,
        _entry: NewEntry,
        _scope: CountScope,
    ) -> Result<WaitlistEntry, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update(
        &self,
        _id: &EntryId,
        _patch: EntryPatch,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn delete(&self, _id: &EntryId) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn shift_pending_after(&self, _position: u32) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Delegates to an in-memory store but reports selected entries as gone on update,
/// as if another request had deleted them in between.
#[derive(Default)]
pub(super) struct VanishingStore {
    pub(super) inner: InMemoryWaitlistStore,
    vanished: Mutex<HashSet<String>>,
}

impl VanishingStore {
    pub(super) fn vanish(&self, email: &str) {
        self.vanished
            .lock()
            .expect("vanish mutex poisoned")
            .insert(email.to_string());
    }

    fn is_vanished(&self, id: &EntryId) -> bool {
        let vanished = self.vanished.lock().expect("vanish mutex poisoned");
        self.inner
            .snapshot()
            .expect("snapshot")
            .iter()
            .any(|entry| &entry.id == id && vanished.contains(&entry.email))
    }
}

impl WaitlistStore for VanishingStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn find_many(
        &self,
        filter: &EntryFilter,
        page: Page,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        self.inner.find_many(filter, page).await
    }

    async fn count(&self, filter: &EntryFilter) -> Result<u64, StoreError> {
        self.inner.count(filter).await
    }

    async fn create(&self, entry: NewEntry, scope: CountScope) -> Result<WaitlistEntry, StoreError> {
        self.inner.create(entry, scope).await
    }

    async fn update(
        &self,
        id: &EntryId,
        patch: EntryPatch,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        if self.is_vanished(id) {
            return Ok(None);
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &EntryId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn shift_pending_after(&self, position: u32) -> Result<u64, StoreError> {
        self.inner.shift_pending_after(position).await
    }
}

/// Delegates to an in-memory store but reports an impossibly long queue ahead of any
/// position lookup.
#[derive(Default)]
pub(super) struct InflatedCountStore {
    pub(super) inner: InMemoryWaitlistStore,
}

impl WaitlistStore for InflatedCountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn find_many(
        &self,
        filter: &EntryFilter,
        page: Page,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        self.inner.find_many(filter, page).await
    }

    async fn count(&self, filter: &EntryFilter) -> Result<u64, StoreError> {
        if filter.position_below.is_some() {
            return Ok(u64::from(u32::MAX));
        }
        self.inner.count(filter).await
    }

    async fn create(&self, entry: NewEntry, scope: CountScope) -> Result<WaitlistEntry, StoreError> {
        self.inner.create(entry, scope).await
    }

    async fn update(
        &self,
        id: &EntryId,
        patch: EntryPatch,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &EntryId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn shift_pending_after(&self, position: u32) -> Result<u64, StoreError> {
        self.inner.shift_pending_after(position).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
