//! In-process record store.

use super::{EntityPayload, EntityRecord, RecordStore, StoreResult};
use crate::error::{StoreError, StoreOperation};
use crate::record_id::RecordId;
use crate::schedule::ScheduleRow;
use crate::schema::EntityKind;
use crate::visibility::VisibilityConfig;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    visibility: HashMap<EntityKind, VisibilityConfig>,
    records: BTreeMap<(EntityKind, String), EntityRecord>,
    schedule: Vec<ScheduleRow>,
    failures: HashSet<StoreOperation>,
    calls: HashMap<StoreOperation, usize>,
}

/// A [`RecordStore`] held entirely in memory.
///
/// Every call is counted per [`StoreOperation`], and [`fail_next`](MemoryStore::fail_next)
/// makes the next call of an operation fail with [`StoreError::Unavailable`] without side
/// effects.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and applies any pending injected failure.
    fn enter(&self, operation: StoreOperation) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;
        if state.failures.remove(&operation) {
            return Err(StoreError::Unavailable(format!(
                "injected {operation} failure"
            )));
        }
        Ok(state)
    }

    /// Makes the next `operation` call fail.
    pub fn fail_next(&self, operation: StoreOperation) {
        self.lock().failures.insert(operation);
    }

    /// How many times `operation` has been called, including failed calls.
    pub fn calls(&self, operation: StoreOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn seed_visibility(&self, kind: EntityKind, config: VisibilityConfig) {
        self.lock().visibility.insert(kind, config);
    }

    pub fn stored_visibility(&self, kind: EntityKind) -> Option<VisibilityConfig> {
        self.lock().visibility.get(&kind).cloned()
    }

    pub fn seed_schedule(&self, rows: impl IntoIterator<Item = ScheduleRow>) {
        self.lock().schedule.extend(rows);
    }

    /// Rows currently stored for `owner_id`, in insertion order.
    pub fn schedule_rows(&self, owner_id: &str) -> Vec<ScheduleRow> {
        self.lock()
            .schedule
            .iter()
            .filter(|row| row.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn record_count(&self, kind: EntityKind) -> usize {
        self.lock()
            .records
            .keys()
            .filter(|(record_kind, _)| *record_kind == kind)
            .count()
    }
}

impl RecordStore for MemoryStore {
    async fn load_visibility(&self, kind: EntityKind) -> StoreResult<Option<VisibilityConfig>> {
        let state = self.enter(StoreOperation::LoadVisibility)?;
        Ok(state.visibility.get(&kind).cloned())
    }

    async fn save_visibility(&self, kind: EntityKind, config: &VisibilityConfig) -> StoreResult<()> {
        let mut state = self.enter(StoreOperation::SaveVisibility)?;
        state.visibility.insert(kind, config.clone());
        Ok(())
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        payload: &EntityPayload,
    ) -> StoreResult<EntityRecord> {
        let mut state = self.enter(StoreOperation::CreateEntity)?;
        let now = Utc::now();
        let record = EntityRecord {
            id: RecordId::new().to_string(),
            kind,
            fields: payload.clone(),
            created_at: now,
            updated_at: now,
        };
        state
            .records
            .insert((kind, record.id.clone()), record.clone());
        Ok(record)
    }

    async fn update_entity(
        &self,
        kind: EntityKind,
        id: &str,
        payload: &EntityPayload,
    ) -> StoreResult<EntityRecord> {
        let mut state = self.enter(StoreOperation::UpdateEntity)?;
        let record = state
            .records
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        record
            .fields
            .extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn get_entity(&self, kind: EntityKind, id: &str) -> StoreResult<Option<EntityRecord>> {
        let state = self.enter(StoreOperation::GetEntity)?;
        Ok(state.records.get(&(kind, id.to_string())).cloned())
    }

    async fn list_entities(&self, kind: EntityKind) -> StoreResult<Vec<EntityRecord>> {
        let state = self.enter(StoreOperation::ListEntities)?;
        Ok(state
            .records
            .values()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect())
    }

    async fn delete_schedule(&self, owner_id: &str) -> StoreResult<()> {
        let mut state = self.enter(StoreOperation::DeleteSchedule)?;
        state.schedule.retain(|row| row.owner_id != owner_id);
        Ok(())
    }

    async fn insert_schedule(&self, rows: &[ScheduleRow]) -> StoreResult<()> {
        let mut state = self.enter(StoreOperation::InsertSchedule)?;
        state.schedule.extend_from_slice(rows);
        Ok(())
    }

    async fn list_schedule(
        &self,
        owner_ids: Option<&BTreeSet<String>>,
    ) -> StoreResult<Vec<ScheduleRow>> {
        let state = self.enter(StoreOperation::ListSchedule)?;
        Ok(state
            .schedule
            .iter()
            .filter(|row| owner_ids.map_or(true, |ids| ids.contains(&row.owner_id)))
            .cloned()
            .collect())
    }
}
