//! In-memory store for tests and demos.

use crate::error::StorageResult;
use crate::traits::{CodeLookup, EventSink};
use gatewarden_core::{AccessCode, AccessTags, Contact, GateAccessEvent};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    codes: Vec<AccessCode>,
    contacts: Vec<Contact>,
    events: Vec<GateAccessEvent>,
}

/// Vectors behind a lock. Ids are assigned on insert, starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_code(&self, mut code: AccessCode) -> i64 {
        let mut tables = self.tables.write().await;
        code.id = tables.codes.len() as i64 + 1;
        let id = code.id;
        tables.codes.push(code);
        id
    }

    pub async fn add_contact(&self, mut contact: Contact) -> i64 {
        let mut tables = self.tables.write().await;
        contact.id = tables.contacts.len() as i64 + 1;
        let id = contact.id;
        tables.contacts.push(contact);
        id
    }

    /// Everything recorded so far, oldest first.
    pub async fn events(&self) -> Vec<GateAccessEvent> {
        self.tables.read().await.events.clone()
    }
}

impl CodeLookup for InMemoryStore {
    async fn find_active_code(&self, pin: &str) -> StorageResult<Option<AccessCode>> {
        let tables = self.tables.read().await;
        let mut hits = tables.codes.iter().filter(|c| c.active && c.matches(pin));
        Ok(match (hits.next(), hits.next()) {
            (Some(code), None) => Some(code.clone()),
            _ => None,
        })
    }

    async fn find_account_contacts(&self, account_id: i64) -> StorageResult<Vec<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables
            .contacts
            .iter()
            .filter(|c| c.active && c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_group_contacts(&self, tags: AccessTags) -> StorageResult<Vec<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables
            .contacts
            .iter()
            .filter(|c| c.active && c.subscribed_to(tags))
            .cloned()
            .collect())
    }
}

impl EventSink for InMemoryStore {
    async fn record(&self, event: &GateAccessEvent) -> StorageResult<i64> {
        let mut tables = self.tables.write().await;
        tables.events.push(event.clone());
        Ok(tables.events.len() as i64)
    }
}
