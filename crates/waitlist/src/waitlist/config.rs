use serde::{Deserialize, Serialize};

/// Which entries a count covers when sizing the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountScope {
    #[default]
    All,
    Pending,
}

impl CountScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// How `/position` reports an entry's place in the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionReporting {
    /// Dense 1-based rank among currently pending entries; `None` once an entry leaves pending.
    #[default]
    Rank,
    /// The stored position field, for any status.
    Stored,
}

impl PositionReporting {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rank" => Some(Self::Rank),
            "stored" | "raw" => Some(Self::Stored),
            _ => None,
        }
    }
}

/// Deployment toggles for the waitlist. Checked once when the service is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistConfig {
    /// Admin operations need a validated session.
    pub require_admin: bool,
    /// Capacity limit; `0` means unlimited.
    pub max_entries: u64,
    /// Whether new joins are accepted.
    pub enabled: bool,
    pub allow_status_check: bool,
    /// Include the pending rank in `/status` responses.
    pub show_position: bool,
    /// Stamp `invited_at` on every approval.
    pub invite_on_approve: bool,
    /// Close gaps among pending positions when an entry leaves pending.
    pub renumber_positions: bool,
    pub position_scope: CountScope,
    pub capacity_scope: CountScope,
    pub position_reporting: PositionReporting,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            require_admin: true,
            max_entries: 0,
            enabled: true,
            allow_status_check: true,
            show_position: false,
            invite_on_approve: false,
            renumber_positions: false,
            position_scope: CountScope::All,
            capacity_scope: CountScope::All,
            position_reporting: PositionReporting::Rank,
        }
    }
}

impl WaitlistConfig {
    pub fn validate(self) -> Result<Self, WaitlistConfigError> {
        if self.position_scope == CountScope::Pending && !self.renumber_positions {
            return Err(WaitlistConfigError::PendingScopeWithoutRenumbering);
        }
        Ok(self)
    }

    pub fn has_capacity_limit(&self) -> bool {
        self.max_entries > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitlistConfigError {
    #[error(
        "pending-only position counting requires position renumbering, \
         otherwise new entries reuse positions held by pending entries"
    )]
    PendingScopeWithoutRenumbering,
}
