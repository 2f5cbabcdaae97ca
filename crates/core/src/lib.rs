//! # Clinic Core
//!
//! The record-form engine behind the clinic's patient and doctor wizards.
//!
//! This crate owns everything between "which fields exist" and "what was written":
//! - Field schemas per entity kind and the administrator-controlled visibility of optional
//!   fields, persisted per kind under a namespaced key
//! - Active-field resolution and grouping into ordered wizard steps
//! - Per-step completeness checks, including the doctor's weekly schedule
//! - The schedule codec between the per-day draft and stored day-indexed rows
//! - Form sessions that write the entity and then replace its schedule
//! - The [`RecordStore`] persistence boundary, with in-memory and on-disk implementations
//!
//! **No API concerns**: HTTP servers, authentication and command-line parsing belong in
//! `api-rest`, `api-shared` or `clinic-cli`.

pub mod config;
pub mod constants;
pub mod draft;
pub mod error;
pub mod fields;
pub mod record_id;
pub mod repositories;
pub mod schedule;
pub mod schema;
pub mod service;
pub mod session;
pub mod step_validation;
pub mod steps;
pub mod validation;
pub mod visibility;

pub use config::CoreConfig;
pub use draft::EntityDraft;
pub use error::{
    ClinicError, ClinicResult, ConfigLockError, PartialSaveError, PersistenceError, SaveError,
    SessionError, StoreError, StoreOperation, ToggleError, ValidationError,
};
pub use record_id::RecordId;
pub use repositories::file::FileStore;
pub use repositories::memory::MemoryStore;
pub use repositories::{EntityPayload, EntityRecord, RecordStore};
pub use schedule::{DayOfWeek, DaySlot, DayStatus, ScheduleDecode, ScheduleDraft, ScheduleRow};
pub use schema::{EntityKind, FieldDefinition, FieldKind, FieldSchema, SchemaRegistry};
pub use service::{FormInput, FormService};
pub use session::{FormSession, SavedRecord, SessionMode, SessionState};
pub use steps::Step;
pub use visibility::{ToggleOutcome, VisibilityConfig, VisibilityStore};
