use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::config::CountScope;
use super::domain::{EntryId, EntryPatch, NewEntry, WaitlistEntry, WaitlistStatus};
use super::store::{EntryFilter, Page, StoreError, WaitlistStore};

#[derive(Debug, Default)]
struct Collection {
    next_id: u64,
    entries: BTreeMap<EntryId, WaitlistEntry>,
}

impl Collection {
    fn count(&self, filter: &EntryFilter) -> u64 {
        self.entries
            .values()
            .filter(|entry| filter.matches(entry))
            .count() as u64
    }
}

/// Process-local store. Every operation runs under a single lock, so `create` and
/// `shift_pending_after` are atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWaitlistStore {
    collection: Arc<Mutex<Collection>>,
}

impl InMemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collection>, StoreError> {
        self.collection
            .lock()
            .map_err(|_| StoreError::Unavailable("waitlist mutex poisoned".to_string()))
    }

    /// Snapshot of every entry ordered by stored position.
    pub fn snapshot(&self) -> Result<Vec<WaitlistEntry>, StoreError> {
        let guard = self.lock()?;
        let mut entries: Vec<_> = guard.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }
}

impl WaitlistStore for InMemoryWaitlistStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .entries
            .values()
            .find(|entry| entry.email == email)
            .cloned())
    }

    async fn find_many(
        &self,
        filter: &EntryFilter,
        page: Page,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let guard = self.lock()?;
        let mut matching: Vec<_> = guard
            .entries
            .values()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));

        let window = matching.into_iter().skip(page.offset);
        Ok(match page.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        })
    }

    async fn count(&self, filter: &EntryFilter) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        Ok(guard.count(filter))
    }

    async fn create(&self, entry: NewEntry, scope: CountScope) -> Result<WaitlistEntry, StoreError> {
        let mut guard = self.lock()?;
        if guard.entries.values().any(|existing| existing.email == entry.email) {
            return Err(StoreError::Conflict);
        }

        let scoped = EntryFilter::scoped(scope);
        let highest = guard
            .entries
            .values()
            .filter(|existing| scoped.matches(existing))
            .map(|existing| existing.position)
            .max()
            .unwrap_or(0);
        let position = highest.checked_add(1).ok_or(StoreError::PositionOverflow)?;
        guard.next_id += 1;
        let id = EntryId(format!("wl-{:06}", guard.next_id));

        let record = WaitlistEntry {
            id: id.clone(),
            email: entry.email,
            status: WaitlistStatus::Pending,
            position,
            user_id: entry.user_id,
            invited_at: None,
            created_at: entry.created_at,
        };
        guard.entries.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &EntryId,
        patch: EntryPatch,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        let mut guard = self.lock()?;
        Ok(guard.entries.get_mut(id).map(|entry| {
            entry.apply(&patch);
            entry.clone()
        }))
    }

    async fn delete(&self, id: &EntryId) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        Ok(guard.entries.remove(id).is_some())
    }

    async fn shift_pending_after(&self, position: u32) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        let filter = EntryFilter::pending().above(position);
        let mut shifted = 0;
        for entry in guard.entries.values_mut() {
            if filter.matches(entry) {
                entry.position -= 1;
                shifted += 1;
            }
        }
        Ok(shifted)
    }
}
