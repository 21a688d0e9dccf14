//! Secret data models and creation rules.
//!
//! This module defines:
//! - `Secret`: a stored secret record, also the JSON body returned to clients
//! - `SecretDraft`: the form body submitted when creating a secret
//!
//! A secret is *eligible* while it has views left and has not expired. Once
//! either condition fails it is dead for good; nothing ever raises
//! `remaining_views` or moves `expires_at`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Represents a secret record from the database.
///
/// # Database Table
///
/// Maps to the `secrets` table, keyed by `hash`.
///
/// # JSON Example
///
/// ```json
/// {
///   "hash": "3b2cfc43-4e9f-4c43-a1f3-6bd1e5bd3c86",
///   "createdAt": "2025-12-20T10:00:00Z",
///   "expiresAt": "2025-12-20T10:05:00Z",
///   "remainingViews": 2,
///   "secretText": "hello"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Opaque unique identifier, the only lookup key
    pub hash: String,

    pub created_at: DateTime<Utc>,

    /// Absolute expiry instant. `None` means the secret never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// How many more times the secret may be retrieved
    pub remaining_views: i32,

    pub secret_text: String,
}

impl Secret {
    /// Whether a view could be claimed at `now`.
    ///
    /// Expiry is exclusive: at the exact `expires_at` instant the secret is
    /// already dead. Storage backends evaluate this same predicate atomically
    /// with the decrement.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.remaining_views > 0 && self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Form body for creating a secret.
///
/// # Form Example
///
/// ```text
/// secret=hello&expireAfterViews=3&expireAfter=10
/// ```
///
/// Missing numeric fields read as `0`: a missing `expireAfterViews` is then
/// rejected, a missing `expireAfter` means "never expires".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecretDraft {
    /// Text to store
    pub secret: String,

    /// Number of permitted retrievals, must be positive
    #[serde(rename = "expireAfterViews")]
    pub expire_after_views: i32,

    /// Lifetime in minutes; 0 never expires, negative is rejected
    #[serde(rename = "expireAfter")]
    pub expire_after: i32,
}

impl SecretDraft {
    /// Check the draft's numeric bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.expire_after < 0 {
            return Err(AppError::Validation("invalid expireAfter value".to_string()));
        }

        if self.expire_after_views <= 0 {
            return Err(AppError::Validation(
                "invalid expireAfterViews value".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the draft and turn it into a fully-formed record.
    ///
    /// Assigns a fresh random (v4) UUID as the hash and converts the relative
    /// expiry into an absolute instant measured from `now`. Nothing is
    /// persisted here.
    pub fn validate_and_fill(self, now: DateTime<Utc>) -> Result<Secret, AppError> {
        self.validate()?;

        let expires_at =
            (self.expire_after > 0).then(|| now + TimeDelta::minutes(i64::from(self.expire_after)));

        Ok(Secret {
            hash: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at,
            remaining_views: self.expire_after_views,
            secret_text: self.secret,
        })
    }
}
