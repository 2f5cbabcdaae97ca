use crate::repositories::EntityRecord;
use crate::schedule::DayOfWeek;
use crate::schema::{EntityKind, FieldDefinition};
use crate::visibility::VisibilityConfig;

/// Failure raised by a [`RecordStore`](crate::repositories::RecordStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to (de)serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{kind} record {id} not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid record id: {0}")]
    InvalidId(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// The persistence-boundary call that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    LoadVisibility,
    SaveVisibility,
    CreateEntity,
    UpdateEntity,
    GetEntity,
    ListEntities,
    DeleteSchedule,
    InsertSchedule,
    ListSchedule,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadVisibility => "load_visibility",
            Self::SaveVisibility => "save_visibility",
            Self::CreateEntity => "create_entity",
            Self::UpdateEntity => "update_entity",
            Self::GetEntity => "get_entity",
            Self::ListEntities => "list_entities",
            Self::DeleteSchedule => "delete_schedule",
            Self::InsertSchedule => "insert_schedule",
            Self::ListSchedule => "list_schedule",
        }
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store failure tagged with the operation that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct PersistenceError {
    pub operation: StoreOperation,
    #[source]
    pub source: StoreError,
}

impl PersistenceError {
    pub fn new(operation: StoreOperation, source: StoreError) -> Self {
        Self { operation, source }
    }
}

/// Which half of a schedule replace failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplaceStage {
    Delete,
    Insert,
}

impl std::fmt::Display for ReplaceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Insert => f.write_str("insert"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("schedule replace failed during {stage}: {source}")]
pub struct ScheduleReplaceError {
    pub stage: ReplaceStage,
    #[source]
    pub source: StoreError,
}

/// The entity write succeeded but the schedule replace that follows it did not.
///
/// The two writes are not transactional, so the record exists in the store while its
/// schedule rows are stale (delete failed) or gone entirely (insert failed).
#[derive(Debug, thiserror::Error)]
#[error(
    "{} record {} saved, but schedule not updated ({stage} failed): {source}",
    .record.kind,
    .record.id
)]
pub struct PartialSaveError {
    pub record: Box<EntityRecord>,
    pub stage: ReplaceStage,
    #[source]
    pub source: StoreError,
}

impl PartialSaveError {
    /// True when the delete half ran, leaving the owner with zero schedule rows.
    pub fn schedule_cleared(&self) -> bool {
        self.stage == ReplaceStage::Insert
    }
}

/// A step (or the whole form) is not complete enough to advance or save.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{} is required", .field.label)]
    MissingField { field: FieldDefinition },
    #[error("{} {reason}", .field.label)]
    InvalidValue {
        field: FieldDefinition,
        reason: &'static str,
    },
    #[error("{day} has a start or end time but not both")]
    HalfFilledDay { day: DayOfWeek },
    #[error("{day} hours are invalid: {reason}")]
    InvalidHours { day: DayOfWeek, reason: &'static str },
}

impl ValidationError {
    /// The offending field, for field-level failures.
    pub fn field(&self) -> Option<&FieldDefinition> {
        match self {
            Self::MissingField { field } | Self::InvalidValue { field, .. } => Some(field),
            Self::HalfFilledDay { .. } | Self::InvalidHours { .. } => None,
        }
    }

    /// The offending day, for schedule failures.
    pub fn day(&self) -> Option<DayOfWeek> {
        match self {
            Self::HalfFilledDay { day } | Self::InvalidHours { day, .. } => Some(*day),
            Self::MissingField { .. } | Self::InvalidValue { .. } => None,
        }
    }
}

/// A visibility toggle was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigLockError {
    #[error("{field_id} is mandatory and cannot be disabled")]
    MandatoryLocked { field_id: &'static str },
}

impl ConfigLockError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MandatoryLocked { .. } => "mandatory-locked",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error("{kind} has no field named {field_id}")]
    UnknownField { kind: EntityKind, field_id: String },
    #[error("failed to load visibility configuration: {0}")]
    Load(#[source] PersistenceError),
    /// The store rejected the write; `previous` is the configuration still in effect.
    #[error("failed to save visibility configuration: {source}")]
    Persistence {
        previous: VisibilityConfig,
        #[source]
        source: PersistenceError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a save is in progress; the form is locked")]
    Locked,
    #[error("the form session is closed")]
    Closed,
    #[error("the form has no steps to show")]
    NoSteps,
    #[error("save is only available from the final step (on step {current} of {last})")]
    NotOnFinalStep { current: usize, last: usize },
    #[error("already on the final step")]
    AtFinalStep,
    #[error("step {index} does not exist (form has {count} steps)")]
    StepOutOfRange { index: usize, count: usize },
    #[error("{0} is not an active field on this form")]
    UnknownField(String),
    #[error("this form has no schedule")]
    NoSchedule,
    #[error("step {step} is incomplete: {error}")]
    Validation {
        step: usize,
        #[source]
        error: ValidationError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("step {step} is incomplete: {error}")]
    Validation {
        step: usize,
        #[source]
        error: ValidationError,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    PartialSave(#[from] PartialSaveError),
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error(transparent)]
    Text(#[from] clinic_types::TextError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Toggle(#[from] ToggleError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
