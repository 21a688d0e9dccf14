//! Persistence for secret records.
//!
//! All shared mutable state lives behind [`SecretStore`]. A claim is a single
//! conditional mutation inside the backend: the eligibility check and the
//! decrement can never be split across two calls, so concurrent claims on
//! one hash are serialized by the backend alone.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{error::AppError, models::secret::Secret};

pub use memory::MemorySecretStore;
pub use postgres::PgSecretStore;

/// Storage backend for secret records.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Persist a newly created record.
    ///
    /// Fails with [`AppError::Conflict`] if the hash is already taken.
    async fn insert(&self, secret: &Secret) -> Result<(), AppError>;

    /// Atomically take one view of the secret identified by `hash`.
    ///
    /// Decrements `remaining_views` only if the record exists, still has
    /// views left and has not expired at `now`. Returns the record as it
    /// stands after the decrement, or `None` if nothing matched. A `None`
    /// leaves storage untouched.
    async fn claim_view(&self, hash: &str, now: DateTime<Utc>)
    -> Result<Option<Secret>, AppError>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), AppError>;
}
