//! The persistence boundary and its implementations.
//!
//! The form engine talks to storage only through [`RecordStore`]. Two implementations ship
//! with the crate:
//! - [`memory::MemoryStore`] keeps everything in process and can be told to fail specific
//!   operations, which is how save-failure paths are exercised.
//! - [`file::FileStore`] persists under the configured data directory: visibility maps and
//!   schedule rows as JSON, entity records as YAML in sharded per-record directories.

pub mod file;
pub mod memory;

use crate::error::{ReplaceStage, ScheduleReplaceError, StoreError};
use crate::schedule::ScheduleRow;
use crate::schema::EntityKind;
use crate::visibility::VisibilityConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

/// Field values written for an entity; `None` clears a value.
pub type EntityPayload = BTreeMap<String, Option<String>>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored patient or doctor record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub fields: EntityPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityRecord {
    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).and_then(|value| value.as_deref())
    }
}

/// Storage operations the form engine depends on.
///
/// Every call is a suspension point; implementations must not assume any ordering beyond what
/// the caller awaits. [`replace_schedule`](RecordStore::replace_schedule) is provided in terms
/// of the delete and insert halves and is deliberately not transactional.
pub trait RecordStore: Send + Sync {
    /// Stored visibility map for `kind`, or `None` if nothing has been saved yet.
    fn load_visibility(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = StoreResult<Option<VisibilityConfig>>> + Send;

    fn save_visibility(
        &self,
        kind: EntityKind,
        config: &VisibilityConfig,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn create_entity(
        &self,
        kind: EntityKind,
        payload: &EntityPayload,
    ) -> impl Future<Output = StoreResult<EntityRecord>> + Send;

    /// Merges `payload` into the stored record's fields.
    fn update_entity(
        &self,
        kind: EntityKind,
        id: &str,
        payload: &EntityPayload,
    ) -> impl Future<Output = StoreResult<EntityRecord>> + Send;

    fn get_entity(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> impl Future<Output = StoreResult<Option<EntityRecord>>> + Send;

    fn list_entities(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = StoreResult<Vec<EntityRecord>>> + Send;

    /// Removes every schedule row owned by `owner_id`.
    fn delete_schedule(&self, owner_id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    fn insert_schedule(&self, rows: &[ScheduleRow])
        -> impl Future<Output = StoreResult<()>> + Send;

    /// Rows for the given owners, or for every owner when `owner_ids` is `None`.
    fn list_schedule(
        &self,
        owner_ids: Option<&BTreeSet<String>>,
    ) -> impl Future<Output = StoreResult<Vec<ScheduleRow>>> + Send;

    /// Deletes the owner's rows, then inserts `rows`.
    ///
    /// The insert only starts once the delete has completed. A failure after the delete leaves
    /// the owner with no rows; the returned error names the stage so callers can say so.
    fn replace_schedule(
        &self,
        owner_id: &str,
        rows: &[ScheduleRow],
    ) -> impl Future<Output = Result<(), ScheduleReplaceError>> + Send {
        async move {
            self.delete_schedule(owner_id)
                .await
                .map_err(|source| ScheduleReplaceError {
                    stage: ReplaceStage::Delete,
                    source,
                })?;

            if rows.is_empty() {
                return Ok(());
            }

            self.insert_schedule(rows)
                .await
                .map_err(|source| ScheduleReplaceError {
                    stage: ReplaceStage::Insert,
                    source,
                })
        }
    }
}
