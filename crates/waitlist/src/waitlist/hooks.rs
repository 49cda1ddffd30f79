use std::future::Future;

use super::domain::WaitlistEntry;

/// Lifecycle callbacks invoked inline by the service.
///
/// Every method defaults to a no-op, so deployments override only what they need.
/// A returned error fails the triggering request; the write that preceded the hook is
/// not rolled back.
pub trait WaitlistHooks: Send + Sync {
    /// Called with the freshly created entry.
    fn on_join(&self, entry: &WaitlistEntry) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = entry;
        async { Ok(()) }
    }

    /// Called with the entry after it has been approved.
    fn on_approve(
        &self,
        entry: &WaitlistEntry,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = entry;
        async { Ok(()) }
    }

    /// Called with the entry after it has been rejected.
    fn on_reject(&self, entry: &WaitlistEntry) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = entry;
        async { Ok(()) }
    }

    /// Called with the entry snapshot before it is deleted.
    fn on_complete(
        &self,
        entry: &WaitlistEntry,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = entry;
        async { Ok(()) }
    }
}

/// Hooks for deployments that configure no callbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl WaitlistHooks for NoopHooks {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{hook} hook failed: {message}")]
pub struct HookError {
    pub hook: &'static str,
    pub message: String,
}

impl HookError {
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}
