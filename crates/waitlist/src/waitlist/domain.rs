use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the persistence adapter when an entry is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Triage state of a waitlist entry.
///
/// Entries start `Pending`; administrators move them to `Approved` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Pending,
    Approved,
    Rejected,
}

impl WaitlistStatus {
    pub fn label(self) -> &'static str {
        match self {
            WaitlistStatus::Pending => "pending",
            WaitlistStatus::Approved => "approved",
            WaitlistStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One email's waitlist record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: EntryId,
    pub email: String,
    pub status: WaitlistStatus,
    /// Queue position. Only meaningful while the entry is pending.
    pub position: u32,
    pub user_id: Option<String>,
    pub invited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn is_pending(&self) -> bool {
        self.status == WaitlistStatus::Pending
    }

    pub fn is_invited(&self) -> bool {
        self.invited_at.is_some()
    }

    /// Apply a patch in place, leaving unset fields untouched.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(invited_at) = patch.invited_at {
            self.invited_at = Some(invited_at);
        }
    }
}

/// Entry data handed to the adapter on join. The adapter assigns id and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub email: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update applied by [`WaitlistStore::update`](super::store::WaitlistStore::update).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub status: Option<WaitlistStatus>,
    pub position: Option<u32>,
    pub invited_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn status(status: WaitlistStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn invited(at: DateTime<Utc>) -> Self {
        Self {
            invited_at: Some(at),
            ..Self::default()
        }
    }

    pub fn with_invited_at(mut self, at: DateTime<Utc>) -> Self {
        self.invited_at = Some(at);
        self
    }
}

/// Reasons an email address is refused before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email address is empty")]
    Empty,
    #[error("'{0}' is not a valid email address")]
    Malformed(String),
}

/// Trim and lower-case an address, rejecting values that cannot be an email.
pub fn normalize_email(raw: &str) -> Result<String, EmailError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(EmailError::Empty);
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if well_formed {
        Ok(email)
    } else {
        Err(EmailError::Malformed(email))
    }
}

/// Public status-check payload. `position` is omitted entirely when not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub email: String,
    pub status: WaitlistStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Position lookup payload. `position` serializes as `null` when unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionView {
    pub email: String,
    pub position: Option<u32>,
    pub status: WaitlistStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPage {
    pub entries: Vec<WaitlistEntry>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WaitlistStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoteAllOutcome {
    pub promoted: usize,
    pub entries: Vec<WaitlistEntry>,
}

/// Confirmation returned after an entry leaves the waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedEntry {
    pub success: bool,
    pub entry: WaitlistEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(
            normalize_email("  Ada@Example.COM \n").expect("valid email"),
            "ada@example.com"
        );
    }

    #[test]
    fn normalize_rejects_blank_and_malformed_addresses() {
        assert_eq!(normalize_email("   "), Err(EmailError::Empty));
        assert!(matches!(
            normalize_email("no-at-sign"),
            Err(EmailError::Malformed(_))
        ));
        assert!(matches!(
            normalize_email("@example.com"),
            Err(EmailError::Malformed(_))
        ));
        assert!(matches!(
            normalize_email("a@b@c"),
            Err(EmailError::Malformed(_))
        ));
        assert!(matches!(
            normalize_email("a b@example.com"),
            Err(EmailError::Malformed(_))
        ));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&WaitlistStatus::Approved).expect("serializes");
        assert_eq!(json, "\"approved\"");
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let created_at = Utc::now();
        let mut entry = WaitlistEntry {
            id: EntryId("wl-000001".to_string()),
            email: "ada@example.com".to_string(),
            status: WaitlistStatus::Pending,
            position: 4,
            user_id: None,
            invited_at: None,
            created_at,
        };

        entry.apply(&EntryPatch::status(WaitlistStatus::Approved));
        assert_eq!(entry.status, WaitlistStatus::Approved);
        assert_eq!(entry.position, 4);
        assert!(entry.invited_at.is_none());
    }
}
