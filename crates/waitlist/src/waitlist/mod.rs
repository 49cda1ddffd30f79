//! Waitlist entry lifecycle: joining, triage, invitations and completion.
//!
//! [`WaitlistService`] holds the business rules and talks to persistence only through
//! [`WaitlistStore`]. Callbacks are supplied through [`WaitlistHooks`].

pub mod config;
pub mod domain;
pub mod hooks;
pub mod memory;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{CountScope, PositionReporting, WaitlistConfig, WaitlistConfigError};
pub use domain::{
    normalize_email, CompletedEntry, EmailError, EntryId, EntryPatch, ListPage, NewEntry,
    PositionView, PromoteAllOutcome, StatusView, WaitlistEntry, WaitlistStats, WaitlistStatus,
};
pub use hooks::{HookError, NoopHooks, WaitlistHooks};
pub use memory::InMemoryWaitlistStore;
pub use router::waitlist_router;
pub use service::{
    ErrorKind, ListQuery, Session, WaitlistError, WaitlistService, DEFAULT_LIST_LIMIT,
    MAX_LIST_LIMIT,
};
pub use store::{EntryFilter, Page, StoreError, WaitlistStore};
