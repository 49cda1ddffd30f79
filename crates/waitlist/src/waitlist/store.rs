use std::future::Future;

use super::config::CountScope;
use super::domain::{EntryId, EntryPatch, NewEntry, WaitlistEntry, WaitlistStatus};

/// Predicate over waitlist entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub status: Option<WaitlistStatus>,
    /// Strictly smaller stored position.
    pub position_below: Option<u32>,
    /// Strictly greater stored position.
    pub position_above: Option<u32>,
    pub uninvited_only: bool,
}

impl EntryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: WaitlistStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn pending() -> Self {
        Self::with_status(WaitlistStatus::Pending)
    }

    pub fn scoped(scope: CountScope) -> Self {
        match scope {
            CountScope::All => Self::all(),
            CountScope::Pending => Self::pending(),
        }
    }

    pub fn below(mut self, position: u32) -> Self {
        self.position_below = Some(position);
        self
    }

    pub fn above(mut self, position: u32) -> Self {
        self.position_above = Some(position);
        self
    }

    pub fn uninvited(mut self) -> Self {
        self.uninvited_only = true;
        self
    }

    pub fn matches(&self, entry: &WaitlistEntry) -> bool {
        self.status.map_or(true, |status| entry.status == status)
            && self
                .position_below
                .map_or(true, |position| entry.position < position)
            && self
                .position_above
                .map_or(true, |position| entry.position > position)
            && (!self.uninvited_only || entry.invited_at.is_none())
    }
}

/// Pagination window. Results are always ordered by ascending stored position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn window(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }
}

/// Persistence adapter for the waitlist collection.
///
/// Implementations own id generation. `create` and `shift_pending_after` must each be
/// atomic with respect to other calls on the same store.
pub trait WaitlistStore: Send + Sync {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<WaitlistEntry>, StoreError>> + Send;

    fn find_many(
        &self,
        filter: &EntryFilter,
        page: Page,
    ) -> impl Future<Output = Result<Vec<WaitlistEntry>, StoreError>> + Send;

    fn count(&self, filter: &EntryFilter) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Insert a pending entry one past the highest stored position within `scope`.
    ///
    /// Positions never collide with a live entry in the scope, even after deletions.
    /// Returns [`StoreError::Conflict`] when the email is already present.
    fn create(
        &self,
        entry: NewEntry,
        scope: CountScope,
    ) -> impl Future<Output = Result<WaitlistEntry, StoreError>> + Send;

    /// Returns `None` when no entry has this id.
    fn update(
        &self,
        id: &EntryId,
        patch: EntryPatch,
    ) -> impl Future<Output = Result<Option<WaitlistEntry>, StoreError>> + Send;

    /// Returns whether an entry was removed.
    fn delete(&self, id: &EntryId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Decrement the position of every pending entry above `position`.
    ///
    /// Returns the number of entries shifted.
    fn shift_pending_after(
        &self,
        position: u32,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("an entry with this email already exists")]
    Conflict,
    #[error("waitlist store unavailable: {0}")]
    Unavailable(String),
    #[error("waitlist position exceeds the supported range")]
    PositionOverflow,
}
