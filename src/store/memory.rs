//! In-memory secret store.
//!
//! Holds records in a map behind a single async mutex. Eligibility check and
//! decrement happen under the same guard, which gives the same contract as
//! the Postgres conditional update. Nothing survives a restart.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::SecretStore;
use crate::{error::AppError, models::secret::Secret};

#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: Arc<Mutex<HashMap<String, Secret>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stored state of a record, without consuming a view.
    #[cfg(test)]
    pub async fn peek(&self, hash: &str) -> Option<Secret> {
        self.secrets.lock().await.get(hash).cloned()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.secrets.lock().await.is_empty()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn insert(&self, secret: &Secret) -> Result<(), AppError> {
        match self.secrets.lock().await.entry(secret.hash.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(secret.clone());
                Ok(())
            }
        }
    }

    async fn claim_view(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Secret>, AppError> {
        let mut secrets = self.secrets.lock().await;

        let Some(secret) = secrets.get_mut(hash) else {
            return Ok(None);
        };
        if !secret.is_eligible(now) {
            return Ok(None);
        }

        secret.remaining_views -= 1;
        Ok(Some(secret.clone()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
