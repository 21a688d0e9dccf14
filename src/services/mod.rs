//! Business logic services.
//!
//! Services sit between the HTTP handlers and the storage backends.

pub mod secret_service;
