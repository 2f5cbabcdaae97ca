//! In-progress form data.

use crate::repositories::{EntityPayload, EntityRecord};
use crate::schedule::ScheduleDraft;
use crate::schema::{FieldDefinition, FieldSchema};
use clinic_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values typed into one open form, plus the weekly schedule for kinds that have one.
///
/// Never persisted as-is; [`EntityDraft::payload`] derives what is written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDraft {
    #[serde(default)]
    values: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule: Option<ScheduleDraft>,
}

impl EntityDraft {
    /// An empty draft shaped for `schema`.
    pub fn new(schema: &FieldSchema) -> Self {
        Self {
            values: BTreeMap::new(),
            schedule: schema.has_schedule().then(ScheduleDraft::new),
        }
    }

    /// A draft pre-populated from a stored record, for editing.
    pub fn from_record(
        schema: &FieldSchema,
        record: &EntityRecord,
        schedule: Option<ScheduleDraft>,
    ) -> Self {
        let mut draft = Self::new(schema);
        draft.values = record.fields.clone();
        if let (Some(slot), Some(schedule)) = (draft.schedule.as_mut(), schedule) {
            *slot = schedule;
        }
        draft
    }

    /// The raw value for `field_id`, if one was entered.
    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).and_then(|value| value.as_deref())
    }

    /// The value for `field_id` if it is present (non-blank).
    pub fn present(&self, field_id: &str) -> Option<NonEmptyText> {
        NonEmptyText::from_optional(self.value(field_id))
    }

    pub fn set(&mut self, field_id: impl Into<String>, value: Option<String>) {
        self.values.insert(field_id.into(), value);
    }

    pub fn schedule(&self) -> Option<&ScheduleDraft> {
        self.schedule.as_ref()
    }

    pub fn schedule_mut(&mut self) -> Option<&mut ScheduleDraft> {
        self.schedule.as_mut()
    }

    /// The values to write for `fields`: blank values become `None`, others are trimmed.
    pub fn payload<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a FieldDefinition>,
    ) -> EntityPayload {
        fields
            .into_iter()
            .map(|field| {
                let value = self.present(field.id).map(NonEmptyText::into_inner);
                (field.id.to_string(), value)
            })
            .collect()
    }
}
