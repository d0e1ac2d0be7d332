//! In-memory presence directory.
//!
//! Shares one map between any number of simulated instances, which is what
//! the cluster tests need. Entries never expire; `set_available(false)`
//! simulates a store outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{InstanceId, PresenceDirectory, PresenceError};

pub struct InMemoryPresenceDirectory {
    entries: RwLock<HashMap<UserId, InstanceId>>,
    available: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryPresenceDirectory {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Toggle a simulated outage; every operation fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of lookup calls (`get_owner` or `get_owners`) served.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Snapshot of all entries.
    pub async fn entries(&self) -> HashMap<UserId, InstanceId> {
        self.entries.read().await.clone()
    }

    fn ensure_available(&self) -> Result<(), PresenceError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PresenceError::Unavailable("simulated outage".to_string()))
        }
    }
}

impl Default for InMemoryPresenceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceDirectory for InMemoryPresenceDirectory {
    async fn set_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<(), PresenceError> {
        self.ensure_available()?;
        self.entries.write().await.insert(*user_id, instance_id.clone());
        Ok(())
    }

    async fn remove_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        if entries.get(user_id) == Some(instance_id) {
            entries.remove(user_id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn get_owner(&self, user_id: &UserId) -> Result<Option<InstanceId>, PresenceError> {
        self.ensure_available()?;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.read().await.get(user_id).cloned())
    }

    async fn get_owners(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, InstanceId>, PresenceError> {
        self.ensure_available()?;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|user_id| entries.get(user_id).map(|owner| (*user_id, owner.clone())))
            .collect())
    }

    async fn refresh_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        match entries.get(user_id) {
            Some(owner) if owner != instance_id => Ok(false),
            _ => {
                entries.insert(*user_id, instance_id.clone());
                Ok(true)
            }
        }
    }
}
