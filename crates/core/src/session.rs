//! One create or edit interaction with the record wizard.
//!
//! A [`FormSession`] holds the draft, the steps it was opened with and the wizard position.
//! It is the only component that writes entities and schedules. Steps are fixed when the
//! session opens; visibility toggles made afterwards apply to the next session.

use crate::draft::EntityDraft;
use crate::error::{
    PartialSaveError, PersistenceError, SaveError, SessionError, StoreOperation,
};
use crate::repositories::{EntityRecord, RecordStore};
use crate::schedule::{encode, DayOfWeek, DaySlot, ScheduleDraft, ScheduleRow};
use crate::schema::{EntityKind, FieldSchema};
use crate::step_validation::{validate_step, validate_steps};
use crate::steps::Step;

/// Whether a save creates a new record or updates an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Create,
    Edit { record_id: String },
}

/// Wizard position. `step` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Open { step: usize },
    Saving,
    Closed,
}

/// What a successful save wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedRecord {
    pub record: EntityRecord,
    /// The rows now stored for the record's schedule; always empty for kinds without one.
    pub schedule_rows: Vec<ScheduleRow>,
}

#[derive(Debug)]
pub struct FormSession {
    schema: &'static FieldSchema,
    steps: Vec<Step>,
    draft: EntityDraft,
    mode: SessionMode,
    state: SessionState,
}

impl FormSession {
    /// Opens an empty form on its first step.
    pub fn create(schema: &'static FieldSchema, steps: Vec<Step>) -> Result<Self, SessionError> {
        Self::open(schema, steps, EntityDraft::new(schema), SessionMode::Create)
    }

    /// Opens a form pre-filled from `record`.
    ///
    /// `schedule` is the record's decoded schedule; it is ignored for kinds without one.
    pub fn edit(
        schema: &'static FieldSchema,
        steps: Vec<Step>,
        record: &EntityRecord,
        schedule: Option<ScheduleDraft>,
    ) -> Result<Self, SessionError> {
        let draft = EntityDraft::from_record(schema, record, schedule);
        let mode = SessionMode::Edit {
            record_id: record.id.clone(),
        };
        Self::open(schema, steps, draft, mode)
    }

    fn open(
        schema: &'static FieldSchema,
        steps: Vec<Step>,
        draft: EntityDraft,
        mode: SessionMode,
    ) -> Result<Self, SessionError> {
        if steps.is_empty() {
            return Err(SessionError::NoSteps);
        }
        Ok(Self {
            schema,
            steps,
            draft,
            mode,
            state: SessionState::Open { step: 1 },
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn draft(&self) -> &EntityDraft {
        &self.draft
    }

    /// The step being shown, while the session is open.
    pub fn current_step(&self) -> Option<&Step> {
        match self.state {
            SessionState::Open { step } => self.steps.get(step - 1),
            SessionState::Saving | SessionState::Closed => None,
        }
    }

    fn last_step(&self) -> usize {
        self.steps.len()
    }

    /// The current step number, or why the session cannot be changed.
    fn open_step(&self) -> Result<usize, SessionError> {
        match self.state {
            SessionState::Open { step } => Ok(step),
            SessionState::Saving => Err(SessionError::Locked),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    /// Sets a field value. Only fields shown on one of the session's steps can be set.
    pub fn set_field(
        &mut self,
        field_id: &str,
        value: Option<String>,
    ) -> Result<(), SessionError> {
        self.open_step()?;
        if !self.steps.iter().any(|step| step.contains_field(field_id)) {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        self.draft.set(field_id, value);
        Ok(())
    }

    /// Sets one day's hours. Empty strings mark the day off.
    pub fn set_day(
        &mut self,
        day: DayOfWeek,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.open_step()?;
        let schedule = self.draft.schedule_mut().ok_or(SessionError::NoSchedule)?;
        schedule.set(day, DaySlot::new(start, end));
        Ok(())
    }

    /// Checks one step of the current draft without moving.
    pub fn validate_step(&self, index: usize) -> Result<(), SessionError> {
        let count = self.steps.len();
        let step = index
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .ok_or(SessionError::StepOutOfRange { index, count })?;
        validate_step(step, &self.draft).map_err(|error| SessionError::Validation {
            step: index,
            error,
        })
    }

    /// Advances one step if the current step validates. Returns the new step number.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        let step = self.open_step()?;
        if step >= self.last_step() {
            return Err(SessionError::AtFinalStep);
        }
        self.validate_step(step)?;
        self.state = SessionState::Open { step: step + 1 };
        Ok(step + 1)
    }

    /// Goes back one step without validating. On the first step this stays put.
    pub fn back(&mut self) -> Result<usize, SessionError> {
        let step = self.open_step()?;
        let previous = step.saturating_sub(1).max(1);
        self.state = SessionState::Open { step: previous };
        Ok(previous)
    }

    /// Closes the session and discards the draft. Cancelling a closed session does nothing.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Saving => Err(SessionError::Locked),
            SessionState::Closed => Ok(()),
            SessionState::Open { .. } => {
                self.draft = EntityDraft::new(self.schema);
                self.state = SessionState::Closed;
                Ok(())
            }
        }
    }

    /// Validates every step, writes the entity, then replaces its schedule.
    ///
    /// Only available from the final step. The session is locked while the writes run and
    /// closes on success. On any failure it returns to the final step with the draft intact.
    /// If the entity was written but the schedule was not, the error is a
    /// [`PartialSaveError`] and a create session switches to editing the new record, so that
    /// saving again updates it instead of creating a duplicate.
    ///
    /// A save future dropped before completion leaves the session locked, since the store
    /// may or may not have applied the writes.
    pub async fn save<S: RecordStore>(&mut self, store: &S) -> Result<SavedRecord, SaveError> {
        let current = self.open_step()?;
        let last = self.last_step();
        if current != last {
            return Err(SessionError::NotOnFinalStep { current, last }.into());
        }
        if let Err((step, error)) = validate_steps(&self.steps, &self.draft) {
            return Err(SaveError::Validation { step, error });
        }

        self.state = SessionState::Saving;
        let result = self.write(store).await;
        match &result {
            Ok(saved) => {
                tracing::info!(
                    kind = %self.schema.kind,
                    id = %saved.record.id,
                    schedule_rows = saved.schedule_rows.len(),
                    "record saved"
                );
                self.state = SessionState::Closed;
            }
            Err(err) => {
                tracing::warn!(kind = %self.schema.kind, error = %err, "record save failed");
                self.state = SessionState::Open { step: last };
            }
        }
        result
    }

    async fn write<S: RecordStore>(&mut self, store: &S) -> Result<SavedRecord, SaveError> {
        let kind = self.schema.kind;
        let payload = self
            .draft
            .payload(self.steps.iter().flat_map(|step| step.fields.iter()));

        let record = match &self.mode {
            SessionMode::Create => store
                .create_entity(kind, &payload)
                .await
                .map_err(|source| PersistenceError::new(StoreOperation::CreateEntity, source))?,
            SessionMode::Edit { record_id } => store
                .update_entity(kind, record_id, &payload)
                .await
                .map_err(|source| PersistenceError::new(StoreOperation::UpdateEntity, source))?,
        };

        let schedule_rows = match self.draft.schedule() {
            Some(schedule) if self.schema.has_schedule() => encode(schedule, &record.id),
            _ => {
                return Ok(SavedRecord {
                    record,
                    schedule_rows: Vec::new(),
                })
            }
        };

        if let Err(err) = store.replace_schedule(&record.id, &schedule_rows).await {
            if self.mode == SessionMode::Create {
                self.mode = SessionMode::Edit {
                    record_id: record.id.clone(),
                };
            }
            return Err(PartialSaveError {
                record: Box::new(record),
                stage: err.stage,
                source: err.source,
            }
            .into());
        }

        Ok(SavedRecord {
            record,
            schedule_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReplaceStage, ValidationError};
    use crate::fields::resolve_active_fields;
    use crate::fields::tests::SCENARIO_SCHEMA;
    use crate::repositories::memory::MemoryStore;
    use crate::schedule::decode;
    use crate::schema::DOCTOR_SCHEMA;
    use crate::steps::group_steps;
    use crate::visibility::VisibilityConfig;

    fn steps_for(schema: &FieldSchema, config: &VisibilityConfig) -> Vec<Step> {
        group_steps(schema, &resolve_active_fields(schema, Some(config)))
    }

    fn scenario_session() -> FormSession {
        let mut config = VisibilityConfig::new();
        config.set("notes", false);
        FormSession::create(&SCENARIO_SCHEMA, steps_for(&SCENARIO_SCHEMA, &config))
            .expect("scenario has steps")
    }

    /// A doctor form with only mandatory fields, filled in and moved to the schedule step.
    fn doctor_on_schedule_step() -> FormSession {
        let steps = steps_for(&DOCTOR_SCHEMA, &VisibilityConfig::new());
        let mut session = FormSession::create(&DOCTOR_SCHEMA, steps).expect("doctor has steps");
        for (field, value) in [
            ("first_name", "Kofi"),
            ("last_name", "Boateng"),
            ("specialization", "Cardiology"),
            ("license_number", "MDC/12345"),
            ("phone", "+233 20 123 4567"),
            ("email", "k.boateng@clinic.org"),
        ] {
            session
                .set_field(field, Some(value.to_string()))
                .expect("field is active");
        }
        while session.next().is_ok() {}
        assert_eq!(session.state(), SessionState::Open { step: 4 });
        session
    }

    #[test]
    fn test_scenario_first_step_requires_name() {
        let mut session = scenario_session();

        let err = session.next().expect_err("name is missing");
        match err {
            SessionError::Validation { step, error } => {
                assert_eq!(step, 1);
                assert_eq!(error.field().map(|f| f.id), Some("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Open { step: 1 });

        session
            .set_field("name", Some("X".into()))
            .expect("name is active");
        assert_eq!(session.next().expect("step 1 is complete"), 2);
    }

    #[test]
    fn test_scenario_second_step_requires_license() {
        let mut session = scenario_session();
        session.set_field("name", Some("X".into())).expect("set");
        session.next().expect("advance");

        let err = session.validate_step(2).expect_err("license is missing");
        assert!(matches!(
            err,
            SessionError::Validation {
                step: 2,
                error: ValidationError::MissingField { .. }
            }
        ));
    }

    #[test]
    fn test_hidden_field_cannot_be_set() {
        let mut session = scenario_session();
        let err = session
            .set_field("notes", Some("hello".into()))
            .expect_err("notes is disabled");
        assert!(matches!(err, SessionError::UnknownField(id) if id == "notes"));
    }

    #[test]
    fn test_back_is_always_allowed_and_stops_at_first_step() {
        let mut session = scenario_session();
        session.set_field("name", Some("X".into())).expect("set");
        session.next().expect("advance");
        session.set_field("name", None).expect("clear");

        assert_eq!(session.back().expect("back"), 1);
        assert_eq!(session.back().expect("back on first step"), 1);
    }

    #[test]
    fn test_validate_step_out_of_range() {
        let session = scenario_session();
        assert!(matches!(
            session.validate_step(0),
            Err(SessionError::StepOutOfRange { index: 0, count: 2 })
        ));
        assert!(matches!(
            session.validate_step(3),
            Err(SessionError::StepOutOfRange { index: 3, count: 2 })
        ));
    }

    #[test]
    fn test_no_active_fields_means_no_session() {
        let err = FormSession::create(&SCENARIO_SCHEMA, Vec::new()).expect_err("no steps");
        assert!(matches!(err, SessionError::NoSteps));
    }

    #[test]
    fn test_schedule_only_on_kinds_that_have_one() {
        let mut session = scenario_session();
        assert!(matches!(
            session.set_day(DayOfWeek::Monday, "09:00", "17:00"),
            Err(SessionError::NoSchedule)
        ));
    }

    #[test]
    fn test_locked_while_saving() {
        let mut session = scenario_session();
        session.state = SessionState::Saving;

        assert!(matches!(
            session.set_field("name", Some("X".into())),
            Err(SessionError::Locked)
        ));
        assert!(matches!(session.next(), Err(SessionError::Locked)));
        assert!(matches!(session.back(), Err(SessionError::Locked)));
        assert!(matches!(session.cancel(), Err(SessionError::Locked)));
    }

    #[test]
    fn test_cancel_closes_and_discards_draft() {
        let mut session = scenario_session();
        session.set_field("name", Some("X".into())).expect("set");

        session.cancel().expect("cancel");
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.draft().value("name"), None);
        assert!(matches!(
            session.set_field("name", Some("Y".into())),
            Err(SessionError::Closed)
        ));
        session.cancel().expect("cancelling again is a no-op");
    }

    #[tokio::test]
    async fn test_save_only_from_final_step() {
        let store = MemoryStore::new();
        let mut session = scenario_session();
        session.set_field("name", Some("X".into())).expect("set");

        let err = session.save(&store).await.expect_err("not on final step");
        assert!(matches!(
            err,
            SaveError::Session(SessionError::NotOnFinalStep { current: 1, last: 2 })
        ));
        assert_eq!(store.calls(StoreOperation::CreateEntity), 0);
    }

    #[tokio::test]
    async fn test_save_validates_every_step() {
        let store = MemoryStore::new();
        let mut session = scenario_session();
        session.set_field("name", Some("X".into())).expect("set");
        session.next().expect("advance");
        session.set_field("license", Some("L-1".into())).expect("set");
        session.set_field("name", Some("   ".into())).expect("blank name");

        let err = session.save(&store).await.expect_err("step 1 is incomplete");
        assert!(matches!(err, SaveError::Validation { step: 1, .. }));
        assert_eq!(store.calls(StoreOperation::CreateEntity), 0);
        assert_eq!(session.state(), SessionState::Open { step: 2 });
    }

    #[tokio::test]
    async fn test_save_creates_record_and_closes() {
        let store = MemoryStore::new();
        let mut session = scenario_session();
        session.set_field("name", Some(" X ".into())).expect("set");
        session.next().expect("advance");
        session.set_field("license", Some("L-1".into())).expect("set");

        let saved = session.save(&store).await.expect("save");

        assert_eq!(saved.record.value("name"), Some("X"));
        assert_eq!(saved.record.value("license"), Some("L-1"));
        assert!(saved.schedule_rows.is_empty());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(store.calls(StoreOperation::DeleteSchedule), 0);
    }

    #[tokio::test]
    async fn test_doctor_save_writes_one_row_for_one_complete_day() {
        let store = MemoryStore::new();
        let mut session = doctor_on_schedule_step();
        session
            .set_day(DayOfWeek::Monday, "09:00", "17:00")
            .expect("doctor has a schedule");

        let saved = session.save(&store).await.expect("save");

        assert_eq!(saved.schedule_rows.len(), 1);
        let row = &saved.schedule_rows[0];
        assert_eq!(row.owner_id, saved.record.id);
        assert_eq!(row.day_index, 1);
        assert_eq!(row.start_time, "09:00");
        assert_eq!(row.end_time, "17:00");
        assert_eq!(row.slot_type, "In-Office");
        assert_eq!(store.schedule_rows(&saved.record.id), saved.schedule_rows);
    }

    #[tokio::test]
    async fn test_half_filled_day_blocks_save() {
        let store = MemoryStore::new();
        let mut session = doctor_on_schedule_step();
        session
            .set_day(DayOfWeek::Wednesday, "09:00", "")
            .expect("set");

        let err = session.save(&store).await.expect_err("half-filled day");
        match err {
            SaveError::Validation { step, error } => {
                assert_eq!(step, 4);
                assert_eq!(error.day(), Some(DayOfWeek::Wednesday));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.calls(StoreOperation::CreateEntity), 0);
    }

    #[tokio::test]
    async fn test_entity_write_failure_skips_schedule() {
        let store = MemoryStore::new();
        let mut session = doctor_on_schedule_step();
        session
            .set_day(DayOfWeek::Monday, "09:00", "17:00")
            .expect("set");
        store.fail_next(StoreOperation::CreateEntity);

        let err = session.save(&store).await.expect_err("create fails");

        assert!(matches!(
            err,
            SaveError::Persistence(PersistenceError {
                operation: StoreOperation::CreateEntity,
                ..
            })
        ));
        assert_eq!(store.calls(StoreOperation::DeleteSchedule), 0);
        assert_eq!(store.calls(StoreOperation::InsertSchedule), 0);
        assert_eq!(session.state(), SessionState::Open { step: 4 });
        assert_eq!(session.mode(), &SessionMode::Create);
    }

    #[tokio::test]
    async fn test_insert_failure_is_a_partial_save_and_retry_updates() {
        let store = MemoryStore::new();
        let mut session = doctor_on_schedule_step();
        session
            .set_day(DayOfWeek::Friday, "08:00", "12:00")
            .expect("set");
        store.fail_next(StoreOperation::InsertSchedule);

        let err = session.save(&store).await.expect_err("insert fails");
        let SaveError::PartialSave(partial) = err else {
            panic!("expected a partial save, got {err:?}");
        };
        assert_eq!(partial.stage, ReplaceStage::Insert);
        assert!(partial.schedule_cleared());
        assert!(store.schedule_rows(&partial.record.id).is_empty());
        assert_eq!(
            session.mode(),
            &SessionMode::Edit {
                record_id: partial.record.id.clone()
            }
        );
        assert_eq!(session.state(), SessionState::Open { step: 4 });

        let saved = session.save(&store).await.expect("retry succeeds");
        assert_eq!(saved.record.id, partial.record.id);
        assert_eq!(store.record_count(EntityKind::Doctor), 1);
        assert_eq!(store.calls(StoreOperation::UpdateEntity), 1);
        assert_eq!(
            decode(&store.schedule_rows(&saved.record.id), &saved.record.id)
                .status(DayOfWeek::Friday),
            crate::schedule::DayStatus::Complete
        );
    }

    #[tokio::test]
    async fn test_edit_session_prefills_and_updates() {
        let store = MemoryStore::new();
        let mut first = doctor_on_schedule_step();
        first
            .set_day(DayOfWeek::Tuesday, "10:00", "14:00")
            .expect("set");
        let saved = first.save(&store).await.expect("save");

        let schedule = decode(&saved.schedule_rows, &saved.record.id);
        let steps = steps_for(&DOCTOR_SCHEMA, &VisibilityConfig::new());
        let mut session = FormSession::edit(&DOCTOR_SCHEMA, steps, &saved.record, Some(schedule))
            .expect("open edit");
        assert_eq!(session.draft().value("first_name"), Some("Kofi"));

        while session.next().is_ok() {}
        session
            .set_day(DayOfWeek::Tuesday, "", "")
            .expect("clear Tuesday");
        let updated = session.save(&store).await.expect("save");

        assert_eq!(updated.record.id, saved.record.id);
        assert!(updated.schedule_rows.is_empty());
        assert!(store.schedule_rows(&saved.record.id).is_empty());
        assert_eq!(store.calls(StoreOperation::InsertSchedule), 1);
    }
}
