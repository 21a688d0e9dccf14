//! Data models representing database entities.

/// Secret record and creation draft
pub mod secret;
