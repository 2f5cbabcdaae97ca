//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - The `HealthService` and its `HealthRes` body
//! - API key validation, independent of any HTTP framework
//!
//! Used by `api-rest` and the `clinic-run` server binary.

pub mod auth;
pub mod health;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::{HealthRes, HealthService};
