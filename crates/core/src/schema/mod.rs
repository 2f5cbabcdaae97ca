//! Compiled-in field catalogs for the record forms.
//!
//! Each [`EntityKind`] has one [`FieldSchema`]: the ordered list of [`FieldDefinition`]s the
//! form may show, the wizard order of the categories those fields belong to, and the small
//! whitelist of fields shown before visibility configuration has loaded.
//!
//! Field types are a tagged variant ([`FieldKind`]) so validators and renderers match
//! exhaustively instead of comparing type strings.

mod doctor;
mod patient;

pub use doctor::DOCTOR_SCHEMA;
pub use patient::PATIENT_SCHEMA;

use crate::ClinicError;
use serde::{Deserialize, Serialize};

/// The two record types governed by the form engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Patient,
    Doctor,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Patient, EntityKind::Doctor];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" | "patients" => Ok(Self::Patient),
            "doctor" | "doctors" => Ok(Self::Doctor),
            _ => Err(ClinicError::UnknownEntityKind(s.to_string())),
        }
    }
}

/// Data type of a field, with the choices for select fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Time,
    Select { options: &'static [&'static str] },
    Textarea,
    Email,
    Tel,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Select { .. } => "select",
            Self::Textarea => "textarea",
            Self::Email => "email",
            Self::Tel => "tel",
        }
    }

    pub fn options(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Select { options } => Some(options),
            _ => None,
        }
    }
}

/// One field a record form may show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub category: &'static str,
    pub mandatory: bool,
}

impl FieldDefinition {
    /// An optional field.
    pub const fn new(
        id: &'static str,
        label: &'static str,
        kind: FieldKind,
        category: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            kind,
            category,
            mandatory: false,
        }
    }

    /// The same field, marked mandatory.
    pub const fn required(self) -> Self {
        Self {
            mandatory: true,
            ..self
        }
    }
}

/// A wizard page grouping; `id` is what [`FieldDefinition::category`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub title: &'static str,
}

/// The full field catalog for one entity kind.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldSchema {
    pub kind: EntityKind,
    pub fields: &'static [FieldDefinition],
    /// Wizard order.
    pub categories: &'static [Category],
    /// Fields shown alongside the mandatory ones when no configuration is available yet.
    pub essentials: &'static [&'static str],
    /// Category whose step carries the weekly schedule editor, if this kind has one.
    pub schedule_category: Option<&'static str>,
}

impl FieldSchema {
    pub fn field(&self, id: &str) -> Option<&'static FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&'static Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn mandatory_fields(&self) -> impl Iterator<Item = &'static FieldDefinition> {
        self.fields.iter().filter(|field| field.mandatory)
    }

    pub fn has_schedule(&self) -> bool {
        self.schedule_category.is_some()
    }

    pub fn is_essential(&self, id: &str) -> bool {
        self.essentials.iter().any(|essential| *essential == id)
    }
}

/// Picks the schema for each entity kind.
///
/// [`SchemaRegistry::builtin`] is what the service uses; tests and embedders can assemble a
/// registry from their own static schemas.
#[derive(Clone, Copy, Debug)]
pub struct SchemaRegistry {
    patient: &'static FieldSchema,
    doctor: &'static FieldSchema,
}

impl SchemaRegistry {
    pub const fn new(patient: &'static FieldSchema, doctor: &'static FieldSchema) -> Self {
        Self { patient, doctor }
    }

    pub fn builtin() -> Self {
        Self::new(&PATIENT_SCHEMA, &DOCTOR_SCHEMA)
    }

    pub fn schema(&self, kind: EntityKind) -> &'static FieldSchema {
        match kind {
            EntityKind::Patient => self.patient,
            EntityKind::Doctor => self.doctor,
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
