//! The form engine's entry point.
//!
//! [`FormService`] owns the record store, the schema registry and the shared visibility
//! configuration. Adapters (REST, CLI) hold one per process and go through it for every
//! operation.

use crate::draft::EntityDraft;
use crate::error::{
    ClinicResult, PersistenceError, SaveError, SessionError, StoreError, StoreOperation,
    ToggleError,
};
use crate::fields::resolve_active_fields;
use crate::repositories::{EntityRecord, RecordStore};
use crate::schedule::{self, ScheduleDecode, ScheduleDraft, ScheduleRow};
use crate::schema::{EntityKind, FieldDefinition, FieldSchema, SchemaRegistry};
use crate::session::{FormSession, SavedRecord};
use crate::step_validation;
use crate::steps::{group_steps, Step};
use crate::visibility::{ToggleOutcome, VisibilityConfig, VisibilityStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Everything a headless caller supplies to create or update a record in one go.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleDraft>,
}

#[derive(Debug)]
pub struct FormService<S> {
    store: Arc<S>,
    registry: SchemaRegistry,
    visibility: VisibilityStore<S>,
}

impl<S: RecordStore> FormService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_registry(store, SchemaRegistry::builtin())
    }

    pub fn with_registry(store: Arc<S>, registry: SchemaRegistry) -> Self {
        Self {
            visibility: VisibilityStore::new(store.clone(), registry),
            store,
            registry,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn schema(&self, kind: EntityKind) -> &'static FieldSchema {
        self.registry.schema(kind)
    }

    /// The fields a new form for `kind` shows, in registry order.
    ///
    /// If the visibility configuration cannot be loaded the form still opens, showing the
    /// mandatory and essential fields.
    pub async fn active_fields(&self, kind: EntityKind) -> Vec<FieldDefinition> {
        let schema = self.schema(kind);
        match self.visibility.load(kind).await {
            Ok(config) => resolve_active_fields(schema, Some(&config)),
            Err(err) => {
                tracing::warn!(%kind, error = %err, "visibility unavailable, showing essential fields");
                resolve_active_fields(schema, None)
            }
        }
    }

    pub async fn steps(&self, kind: EntityKind) -> Vec<Step> {
        let active = self.active_fields(kind).await;
        group_steps(self.schema(kind), &active)
    }

    pub async fn visibility(&self, kind: EntityKind) -> Result<VisibilityConfig, PersistenceError> {
        self.visibility.load(kind).await
    }

    pub async fn reload_visibility(
        &self,
        kind: EntityKind,
    ) -> Result<VisibilityConfig, PersistenceError> {
        self.visibility.reload(kind).await
    }

    pub async fn toggle_field_visibility(
        &self,
        kind: EntityKind,
        field_id: &str,
    ) -> Result<ToggleOutcome, ToggleError> {
        self.visibility.toggle(kind, field_id).await
    }

    pub fn encode_schedule(&self, draft: &ScheduleDraft, owner_id: &str) -> Vec<ScheduleRow> {
        schedule::encode(draft, owner_id)
    }

    pub fn decode_schedule(&self, rows: &[ScheduleRow], owner_id: &str) -> ScheduleDecode {
        schedule::decode_with_report(rows, owner_id)
    }

    pub fn validate_step(&self, session: &FormSession, index: usize) -> Result<(), SessionError> {
        session.validate_step(index)
    }

    /// Opens a create session with the steps currently configured for `kind`.
    pub async fn open_create(&self, kind: EntityKind) -> Result<FormSession, SessionError> {
        let steps = self.steps(kind).await;
        FormSession::create(self.schema(kind), steps)
    }

    /// Opens an edit session on a stored record, with its schedule when the kind has one.
    pub async fn open_edit(&self, kind: EntityKind, id: &str) -> ClinicResult<FormSession> {
        let record = self
            .get_record(kind, id)
            .await?
            .ok_or_else(|| {
                PersistenceError::new(
                    StoreOperation::GetEntity,
                    StoreError::NotFound {
                        kind,
                        id: id.to_string(),
                    },
                )
            })?;

        let schema = self.schema(kind);
        let schedule = if schema.has_schedule() {
            Some(self.schedule_for(&record.id).await?.draft)
        } else {
            None
        };

        let steps = self.steps(kind).await;
        Ok(FormSession::edit(schema, steps, &record, schedule)?)
    }

    pub async fn save(&self, session: &mut FormSession) -> Result<SavedRecord, SaveError> {
        session.save(self.store.as_ref()).await
    }

    /// Creates a record (`record_id == None`) or updates one, walking every step in order.
    ///
    /// Fields in `input` must be active on the form. Unmentioned fields keep their current
    /// value when updating.
    pub async fn submit(
        &self,
        kind: EntityKind,
        record_id: Option<&str>,
        input: FormInput,
    ) -> ClinicResult<SavedRecord> {
        let mut session = match record_id {
            Some(id) => self.open_edit(kind, id).await?,
            None => self.open_create(kind).await?,
        };

        for (field_id, value) in input.fields {
            session.set_field(&field_id, value)?;
        }
        if let Some(schedule) = &input.schedule {
            for (day, slot) in schedule.iter() {
                session.set_day(day, slot.start.clone(), slot.end.clone())?;
            }
        }

        loop {
            match session.next() {
                Ok(_) => {}
                Err(SessionError::AtFinalStep) => break,
                Err(SessionError::Validation { step, error }) => {
                    return Err(SaveError::Validation { step, error }.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(self.save(&mut session).await?)
    }

    pub async fn list_records(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, PersistenceError> {
        self.store
            .list_entities(kind)
            .await
            .map_err(|source| PersistenceError::new(StoreOperation::ListEntities, source))
    }

    pub async fn get_record(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<EntityRecord>, PersistenceError> {
        self.store
            .get_entity(kind, id)
            .await
            .map_err(|source| PersistenceError::new(StoreOperation::GetEntity, source))
    }

    /// The stored schedule for one owner.
    pub async fn schedule_for(&self, owner_id: &str) -> Result<ScheduleDecode, PersistenceError> {
        let owners = BTreeSet::from([owner_id.to_string()]);
        let rows = self
            .store
            .list_schedule(Some(&owners))
            .await
            .map_err(|source| PersistenceError::new(StoreOperation::ListSchedule, source))?;

        let decoded = schedule::decode_with_report(&rows, owner_id);
        if !decoded.unrecognised.is_empty() {
            tracing::warn!(
                owner_id,
                skipped = decoded.unrecognised.len(),
                "schedule rows with unrecognised day index skipped"
            );
        }
        Ok(decoded)
    }

    /// A blank draft for `kind`, for adapters that render a form before opening a session.
    pub fn blank_draft(&self, kind: EntityKind) -> EntityDraft {
        EntityDraft::new(self.schema(kind))
    }

    /// Validates a standalone draft against the current steps, without a session.
    pub async fn check_draft(
        &self,
        kind: EntityKind,
        draft: &EntityDraft,
    ) -> Result<(), SaveError> {
        let steps = self.steps(kind).await;
        step_validation::validate_steps(&steps, draft)
            .map_err(|(step, error)| SaveError::Validation { step, error })
    }
}
