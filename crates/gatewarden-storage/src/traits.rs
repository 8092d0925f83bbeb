//! Collaborator interfaces the access path depends on.
//!
//! The access orchestrator only sees these traits, never a concrete store.
//! Methods return `Send` futures so orchestrator work can be spawned onto the
//! runtime; implementations are free to write them as `async fn`.

use crate::error::StorageResult;
use gatewarden_core::{AccessCode, AccessTags, Contact, GateAccessEvent};
use std::future::Future;

/// Read access to codes and notification contacts.
pub trait CodeLookup: Send + Sync {
    /// The single active code matching `pin`, if exactly one matches.
    ///
    /// Window checks are not applied here.
    fn find_active_code(
        &self,
        pin: &str,
    ) -> impl Future<Output = StorageResult<Option<AccessCode>>> + Send;

    /// Active contacts belonging to an account.
    fn find_account_contacts(
        &self,
        account_id: i64,
    ) -> impl Future<Output = StorageResult<Vec<Contact>>> + Send;

    /// Active contacts subscribed to any of `tags`.
    fn find_group_contacts(
        &self,
        tags: AccessTags,
    ) -> impl Future<Output = StorageResult<Vec<Contact>>> + Send;

    /// Who to tell when `code` opens the gate: the owning account for a
    /// personal code, the interest groups for a tagged one.
    fn find_notify_contacts(
        &self,
        code: &AccessCode,
    ) -> impl Future<Output = StorageResult<Vec<Contact>>> + Send {
        async move {
            if code.tags.is_personal() {
                self.find_account_contacts(code.account_id).await
            } else {
                self.find_group_contacts(code.tags).await
            }
        }
    }
}

/// Append-only record of access attempts.
pub trait EventSink: Send + Sync {
    /// Persist one event and return its row id.
    fn record(&self, event: &GateAccessEvent) -> impl Future<Output = StorageResult<i64>> + Send;
}
