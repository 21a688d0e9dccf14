//! Secret service - creation and view consumption.
//!
//! This service handles:
//! - Validating and filling new secrets before they are stored
//! - Claiming a single view of a secret
//!
//! The service keeps no state of its own. Every decision about whether a
//! view may be served is made inside the store, in the same atomic step
//! that consumes the view. Nothing here retries.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::secret::{Secret, SecretDraft},
    store::SecretStore,
};

/// Entry point for the HTTP layer, shared as axum state.
#[derive(Clone)]
pub struct SecretService {
    store: Arc<dyn SecretStore>,
}

impl SecretService {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Validate a draft and persist the resulting secret.
    ///
    /// # Errors
    ///
    /// - `Validation`: non-positive view count or negative expiry; nothing is stored
    /// - `Conflict`: the generated hash already exists
    /// - `StorageUnavailable`: database error occurred
    pub async fn create(&self, draft: SecretDraft) -> Result<Secret, AppError> {
        let secret = draft.validate_and_fill(Utc::now())?;

        self.store.insert(&secret).await?;

        tracing::info!(
            hash = %secret.hash,
            remaining_views = secret.remaining_views,
            expires_at = ?secret.expires_at,
            "secret created"
        );

        Ok(secret)
    }

    /// Consume one view of the secret identified by `hash`.
    ///
    /// Returns the record with `remaining_views` already decremented.
    ///
    /// # Errors
    ///
    /// - `NotEligible`: unknown hash, no views left, or expired; these are
    ///   indistinguishable to the caller. A hash that is not a UUID can never
    ///   have been issued and is reported the same way without touching storage.
    /// - `StorageUnavailable`: database error occurred; no view was consumed
    pub async fn claim_view(&self, hash: &str) -> Result<Secret, AppError> {
        if Uuid::parse_str(hash).is_err() {
            tracing::debug!(hash = ?hash, "malformed secret hash");
            return Err(AppError::NotEligible);
        }

        match self.store.claim_view(hash, Utc::now()).await? {
            Some(secret) => {
                tracing::info!(
                    hash = %secret.hash,
                    remaining_views = secret.remaining_views,
                    "secret view claimed"
                );
                Ok(secret)
            }
            None => {
                tracing::debug!(%hash, "secret not eligible");
                Err(AppError::NotEligible)
            }
        }
    }

    /// Check that the backing store is reachable.
    pub async fn health(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySecretStore;

    fn service() -> (SecretService, MemorySecretStore) {
        let store = MemorySecretStore::new();
        (SecretService::new(Arc::new(store.clone())), store)
    }

    fn draft(text: &str, views: i32, minutes: i32) -> SecretDraft {
        SecretDraft {
            secret: text.to_string(),
            expire_after_views: views,
            expire_after: minutes,
        }
    }

    #[tokio::test]
    async fn single_view_secret_is_served_once() {
        let (service, _) = service();
        let created = service.create(draft("hello", 1, 0)).await.unwrap();

        let claimed = service.claim_view(&created.hash).await.unwrap();
        assert_eq!(claimed.secret_text, "hello");
        assert_eq!(claimed.remaining_views, 0);

        assert!(matches!(
            service.claim_view(&created.hash).await.unwrap_err(),
            AppError::NotEligible
        ));
    }

    #[tokio::test]
    async fn create_stores_requested_views() {
        let (service, store) = service();
        let created = service.create(draft("hello", 4, 10)).await.unwrap();

        let stored = store.peek(&created.hash).await.unwrap();
        assert_eq!(stored, created);
        assert_eq!(stored.remaining_views, 4);
        assert!(stored.expires_at.is_some());
    }

    #[tokio::test]
    async fn invalid_draft_persists_nothing() {
        let (service, store) = service();

        let err = service.create(draft("hello", 0, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.create(draft("hello", 1, -1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_and_exhausted_look_the_same() {
        let (service, _) = service();
        let created = service.create(draft("hello", 1, 0)).await.unwrap();
        service.claim_view(&created.hash).await.unwrap();

        let exhausted = service.claim_view(&created.hash).await.unwrap_err();
        let unknown = service.claim_view("no-such-hash").await.unwrap_err();

        assert_eq!(exhausted.to_string(), unknown.to_string());
        assert!(matches!(exhausted, AppError::NotEligible));
        assert!(matches!(unknown, AppError::NotEligible));
    }

    #[tokio::test]
    async fn malformed_hash_is_not_eligible() {
        let (service, _) = service();
        let long = "a".repeat(200);

        for hash in ["abc\0def", "", "not-a-uuid", long.as_str()] {
            assert!(
                matches!(
                    service.claim_view(hash).await.unwrap_err(),
                    AppError::NotEligible
                ),
                "{hash:?}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_views_race_three_claims() {
        let (service, _) = service();
        let created = service.create(draft("hello", 2, 0)).await.unwrap();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let service = service.clone();
                let hash = created.hash.clone();
                tokio::spawn(async move { service.claim_view(&hash).await })
            })
            .collect();

        let mut texts = Vec::new();
        let mut misses = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(secret) => texts.push(secret.secret_text),
                Err(AppError::NotEligible) => misses += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(texts, vec!["hello".to_string(), "hello".to_string()]);
        assert_eq!(misses, 1);
    }

    #[tokio::test]
    async fn health_reports_store_reachable() {
        let (service, _) = service();
        service.health().await.unwrap();
    }
}
