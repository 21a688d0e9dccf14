//! PostgreSQL secret store.
//!
//! # Atomicity
//!
//! `claim_view` is one `UPDATE ... WHERE <eligible> RETURNING` statement.
//! Postgres takes the row lock, re-evaluates the `WHERE` clause against the
//! latest committed row version and applies the decrement in one step, so
//! two racing claims can never both pass the `remaining_views > 0` check on
//! the last view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SecretStore;
use crate::{db::DbPool, error::AppError, models::secret::Secret};

#[derive(Debug, Clone)]
pub struct PgSecretStore {
    pool: DbPool,
}

impl PgSecretStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretStore for PgSecretStore {
    async fn insert(&self, secret: &Secret) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO secrets (hash, created_at, expires_at, remaining_views, secret_text)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&secret.hash)
        .bind(secret.created_at)
        .bind(secret.expires_at)
        .bind(secret.remaining_views)
        .bind(&secret.secret_text)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn claim_view(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Secret>, AppError> {
        // Same predicate as Secret::is_eligible; expiry is exclusive
        let secret = sqlx::query_as::<_, Secret>(
            r#"
            UPDATE secrets
            SET remaining_views = remaining_views - 1
            WHERE hash = $1
              AND remaining_views > 0
              AND (expires_at IS NULL OR expires_at > $2)
            RETURNING hash, created_at, expires_at, remaining_views, secret_text
            "#,
        )
        .bind(hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(secret)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// These run against a real database:
///
/// ```text
/// DATABASE_URL=postgres://... cargo test -- --ignored
/// ```
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::secret::SecretDraft, services::secret_service::SecretService};
    use chrono::TimeDelta;
    use std::sync::Arc;

    async fn store() -> PgSecretStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::create_pool(url.parse().unwrap(), 20).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        PgSecretStore::new(pool)
    }

    fn secret(views: i32, minutes: i32) -> Secret {
        SecretDraft {
            secret: "hello".to_string(),
            expire_after_views: views,
            expire_after: minutes,
        }
        .validate_and_fill(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn claim_decrements_until_exhausted() {
        let store = store().await;
        let secret = secret(2, 0);
        store.insert(&secret).await.unwrap();

        let first = store.claim_view(&secret.hash, Utc::now()).await.unwrap().unwrap();
        assert_eq!(first.remaining_views, 1);
        assert_eq!(first.secret_text, "hello");

        let second = store.claim_view(&secret.hash, Utc::now()).await.unwrap().unwrap();
        assert_eq!(second.remaining_views, 0);

        assert!(store.claim_view(&secret.hash, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn expired_secret_is_not_claimable() {
        let store = store().await;
        let secret = secret(5, 1);
        store.insert(&secret).await.unwrap();
        let expires_at = secret.expires_at.unwrap();

        assert!(
            store
                .claim_view(&secret.hash, expires_at - TimeDelta::seconds(1))
                .await
                .unwrap()
                .is_some()
        );
        assert!(store.claim_view(&secret.hash, expires_at).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn duplicate_hash_is_conflict() {
        let store = store().await;
        let secret = secret(1, 0);
        store.insert(&secret).await.unwrap();

        let err = store.insert(&secret).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn unknown_hash_is_not_claimable() {
        let store = store().await;
        assert!(
            store
                .claim_view("00000000-0000-0000-0000-000000000000", Utc::now())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn nul_byte_hash_is_not_eligible_through_service() {
        let service = SecretService::new(Arc::new(store().await));

        let err = service.claim_view("abc\0def").await.unwrap_err();
        assert!(matches!(err, AppError::NotEligible), "{err}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[ignore = "requires PostgreSQL"]
    async fn concurrent_claims_never_exceed_views() {
        let store = Arc::new(store().await);
        let secret = secret(5, 0);
        store.insert(&secret).await.unwrap();

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let store = Arc::clone(&store);
                let hash = secret.hash.clone();
                tokio::spawn(async move { store.claim_view(&hash, Utc::now()).await.unwrap() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                successes += 1;
            }
        }

        assert_eq!(successes, 5);
    }
}
