use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::config::{PositionReporting, WaitlistConfig, WaitlistConfigError};
use super::domain::{
    normalize_email, CompletedEntry, EmailError, EntryPatch, ListPage, NewEntry, PositionView,
    PromoteAllOutcome, StatusView, WaitlistEntry, WaitlistStats, WaitlistStatus,
};
use super::hooks::{HookError, NoopHooks, WaitlistHooks};
use super::store::{EntryFilter, Page, StoreError, WaitlistStore};

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 100;

/// Session validated by the host authentication framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Filter and pagination for admin listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub status: Option<WaitlistStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    fn page(&self) -> Result<Page, WaitlistError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(WaitlistError::InvalidQuery(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        Ok(Page::window(
            limit as usize,
            self.offset.unwrap_or(0) as usize,
        ))
    }

    fn filter(&self) -> EntryFilter {
        self.status
            .map(EntryFilter::with_status)
            .unwrap_or_default()
    }
}

/// Waitlist lifecycle manager: join, triage, invite and completion on top of a store.
pub struct WaitlistService<S, H = NoopHooks> {
    store: Arc<S>,
    hooks: Arc<H>,
    config: WaitlistConfig,
}

impl<S> WaitlistService<S, NoopHooks>
where
    S: WaitlistStore + 'static,
{
    pub fn new(store: Arc<S>, config: WaitlistConfig) -> Result<Self, WaitlistConfigError> {
        Self::with_hooks(store, Arc::new(NoopHooks), config)
    }
}

impl<S, H> WaitlistService<S, H>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    pub fn with_hooks(
        store: Arc<S>,
        hooks: Arc<H>,
        config: WaitlistConfig,
    ) -> Result<Self, WaitlistConfigError> {
        let config = config.validate()?;
        Ok(Self {
            store,
            hooks,
            config,
        })
    }

    pub fn config(&self) -> &WaitlistConfig {
        &self.config
    }

    /// Register interest for an email, appending it to the pending queue.
    pub async fn join(
        &self,
        email: &str,
        user_id: Option<String>,
    ) -> Result<WaitlistEntry, WaitlistError> {
        if !self.config.enabled {
            return Err(WaitlistError::Closed);
        }

        let email = normalize_email(email)?;

        if self.config.has_capacity_limit() {
            let count = self
                .store
                .count(&EntryFilter::scoped(self.config.capacity_scope))
                .await?;
            if count >= self.config.max_entries {
                return Err(WaitlistError::Full);
            }
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(WaitlistError::DuplicateEmail);
        }

        let entry = self
            .store
            .create(
                NewEntry {
                    email,
                    user_id,
                    created_at: Utc::now(),
                },
                self.config.position_scope,
            )
            .await?;

        info!(email = %entry.email, position = entry.position, "joined waitlist");
        self.hooks.on_join(&entry).await?;
        Ok(entry)
    }

    pub async fn status(&self, email: &str) -> Result<StatusView, WaitlistError> {
        if !self.config.allow_status_check {
            return Err(WaitlistError::StatusCheckDisabled);
        }

        let entry = self.find(email).await?;
        let position = if self.config.show_position && entry.is_pending() {
            Some(self.pending_rank(&entry).await?)
        } else {
            None
        };

        Ok(StatusView {
            email: entry.email,
            status: entry.status,
            created_at: entry.created_at,
            position,
        })
    }

    pub async fn position(&self, email: &str) -> Result<PositionView, WaitlistError> {
        let entry = self.find(email).await?;
        let position = match self.config.position_reporting {
            PositionReporting::Stored => Some(entry.position),
            PositionReporting::Rank if entry.is_pending() => Some(self.pending_rank(&entry).await?),
            PositionReporting::Rank => None,
        };

        Ok(PositionView {
            email: entry.email,
            position,
            status: entry.status,
        })
    }

    pub async fn list(
        &self,
        session: Option<&Session>,
        query: &ListQuery,
    ) -> Result<ListPage, WaitlistError> {
        self.authorize(session)?;
        let page = query.page()?;
        let filter = query.filter();

        let (entries, total) = tokio::try_join!(
            self.store.find_many(&filter, page),
            self.store.count(&filter),
        )?;

        Ok(ListPage { entries, total })
    }

    /// Counts per status. Each count is a separate store query.
    pub async fn stats(&self, session: Option<&Session>) -> Result<WaitlistStats, WaitlistError> {
        self.authorize(session)?;

        let all = EntryFilter::all();
        let pending = EntryFilter::pending();
        let approved = EntryFilter::with_status(WaitlistStatus::Approved);
        let rejected = EntryFilter::with_status(WaitlistStatus::Rejected);

        let (total, pending, approved, rejected) = tokio::try_join!(
            self.store.count(&all),
            self.store.count(&pending),
            self.store.count(&approved),
            self.store.count(&rejected),
        )?;

        Ok(WaitlistStats {
            total,
            pending,
            approved,
            rejected,
        })
    }

    pub async fn approve(
        &self,
        session: Option<&Session>,
        email: &str,
        send_invite: Option<bool>,
    ) -> Result<WaitlistEntry, WaitlistError> {
        self.authorize(session)?;
        // `invite_on_approve` is a floor: an explicit `false` does not suppress it.
        let invite = send_invite.unwrap_or(false) || self.config.invite_on_approve;
        let updated = self
            .transition(email, WaitlistStatus::Approved, invite, WaitlistError::AlreadyApproved)
            .await?;
        self.hooks.on_approve(&updated).await?;
        Ok(updated)
    }

    pub async fn reject(
        &self,
        session: Option<&Session>,
        email: &str,
    ) -> Result<WaitlistEntry, WaitlistError> {
        self.authorize(session)?;
        let updated = self
            .transition(email, WaitlistStatus::Rejected, false, WaitlistError::AlreadyRejected)
            .await?;
        self.hooks.on_reject(&updated).await?;
        Ok(updated)
    }

    /// Mark a single approved entry as invited.
    pub async fn promote(
        &self,
        session: Option<&Session>,
        email: &str,
    ) -> Result<WaitlistEntry, WaitlistError> {
        self.authorize(session)?;
        let entry = self.find(email).await?;

        if entry.status != WaitlistStatus::Approved {
            return Err(WaitlistError::NotApproved);
        }
        if entry.is_invited() {
            return Err(WaitlistError::AlreadyInvited);
        }

        let updated = self
            .store
            .update(&entry.id, EntryPatch::invited(Utc::now()))
            .await?
            .ok_or(WaitlistError::UpdateFailed)?;

        info!(email = %updated.email, "promoted waitlist entry");
        Ok(updated)
    }

    /// Invite every uninvited entry with `status` (approved by default), in queue order.
    pub async fn promote_all(
        &self,
        session: Option<&Session>,
        status: Option<WaitlistStatus>,
    ) -> Result<PromoteAllOutcome, WaitlistError> {
        self.authorize(session)?;
        let status = status.unwrap_or(WaitlistStatus::Approved);
        if status == WaitlistStatus::Rejected {
            return Err(WaitlistError::UnsupportedPromoteStatus(status));
        }

        let candidates = self
            .store
            .find_many(
                &EntryFilter::with_status(status).uninvited(),
                Page::unbounded(),
            )
            .await?;

        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self
                .store
                .update(&candidate.id, EntryPatch::invited(Utc::now()))
                .await?
            {
                Some(updated) => entries.push(updated),
                None => debug!(id = %candidate.id, "entry vanished before promotion"),
            }
        }

        info!(%status, promoted = entries.len(), "promoted waitlist entries");
        Ok(PromoteAllOutcome {
            promoted: entries.len(),
            entries,
        })
    }

    /// Remove an entry from the waitlist in any state, returning its final snapshot.
    pub async fn complete(
        &self,
        session: Option<&Session>,
        email: &str,
    ) -> Result<CompletedEntry, WaitlistError> {
        self.authorize(session)?;
        let entry = self.find(email).await?;

        self.hooks.on_complete(&entry).await?;
        let removed = self.store.delete(&entry.id).await?;
        if !removed {
            debug!(id = %entry.id, "entry already removed");
        } else if self.config.renumber_positions && entry.is_pending() {
            let shifted = self.store.shift_pending_after(entry.position).await?;
            debug!(position = entry.position, shifted, "closed pending position gap");
        }

        info!(email = %entry.email, status = %entry.status, "completed waitlist entry");
        Ok(CompletedEntry {
            success: true,
            entry,
        })
    }

    fn authorize(&self, session: Option<&Session>) -> Result<(), WaitlistError> {
        if self.config.require_admin && session.is_none() {
            return Err(WaitlistError::Unauthorized);
        }
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<WaitlistEntry, WaitlistError> {
        let email = normalize_email(email)?;
        self.store
            .find_by_email(&email)
            .await?
            .ok_or(WaitlistError::NotFound)
    }

    /// Dense 1-based rank among pending entries, independent of gaps in stored positions.
    async fn pending_rank(&self, entry: &WaitlistEntry) -> Result<u32, WaitlistError> {
        let ahead = self
            .store
            .count(&EntryFilter::pending().below(entry.position))
            .await?;
        u32::try_from(ahead)
            .ok()
            .and_then(|ahead| ahead.checked_add(1))
            .ok_or(WaitlistError::Store(StoreError::PositionOverflow))
    }

    async fn transition(
        &self,
        email: &str,
        target: WaitlistStatus,
        invite: bool,
        already: WaitlistError,
    ) -> Result<WaitlistEntry, WaitlistError> {
        let entry = self.find(email).await?;
        if entry.status == target {
            return Err(already);
        }

        let mut patch = EntryPatch::status(target);
        if invite {
            patch = patch.with_invited_at(Utc::now());
        }

        let updated = self
            .store
            .update(&entry.id, patch)
            .await?
            .ok_or(WaitlistError::UpdateFailed)?;

        if self.config.renumber_positions && entry.is_pending() {
            let shifted = self.store.shift_pending_after(entry.position).await?;
            debug!(position = entry.position, shifted, "closed pending position gap");
        }

        info!(
            email = %updated.email,
            from = %entry.status,
            to = %updated.status,
            invited = updated.is_invited(),
            "waitlist entry transitioned"
        );
        Ok(updated)
    }
}

/// Caller-facing classification of [`WaitlistError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Forbidden,
    BadRequest,
    Unauthorized,
    NotFound,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("waitlist is closed")]
    Closed,
    #[error("waitlist is full")]
    Full,
    #[error("status check is disabled")]
    StatusCheckDisabled,
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),
    #[error("{0}")]
    InvalidQuery(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("email already on waitlist")]
    DuplicateEmail,
    #[error("entry is already approved")]
    AlreadyApproved,
    #[error("entry is already rejected")]
    AlreadyRejected,
    #[error("entry must be approved before promoting")]
    NotApproved,
    #[error("invite already sent")]
    AlreadyInvited,
    #[error("cannot promote {0} entries")]
    UnsupportedPromoteStatus(WaitlistStatus),
    #[error("authentication required")]
    Unauthorized,
    #[error("email not found in waitlist")]
    NotFound,
    #[error("failed to update waitlist entry")]
    UpdateFailed,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl WaitlistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WaitlistError::Closed | WaitlistError::Full | WaitlistError::StatusCheckDisabled => {
                ErrorKind::Forbidden
            }
            WaitlistError::InvalidEmail(_)
            | WaitlistError::InvalidQuery(_)
            | WaitlistError::MalformedRequest(_)
            | WaitlistError::DuplicateEmail
            | WaitlistError::AlreadyApproved
            | WaitlistError::AlreadyRejected
            | WaitlistError::NotApproved
            | WaitlistError::AlreadyInvited
            | WaitlistError::UnsupportedPromoteStatus(_) => ErrorKind::BadRequest,
            WaitlistError::Unauthorized => ErrorKind::Unauthorized,
            WaitlistError::NotFound => ErrorKind::NotFound,
            WaitlistError::UpdateFailed | WaitlistError::Store(_) | WaitlistError::Hook(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<StoreError> for WaitlistError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict => WaitlistError::DuplicateEmail,
            other => WaitlistError::Store(other),
        }
    }
}
