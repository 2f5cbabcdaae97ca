//! Grouping of active fields into wizard steps.

use crate::schema::{FieldDefinition, FieldSchema};
use serde::Serialize;

/// One page of the record wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Step {
    /// 1-based position in the wizard.
    pub index: usize,
    pub title: &'static str,
    pub category: &'static str,
    pub fields: Vec<FieldDefinition>,
    /// Whether the weekly schedule editor follows this step's fields.
    pub schedule: bool,
}

impl Step {
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|field| field.mandatory)
    }

    pub fn contains_field(&self, field_id: &str) -> bool {
        self.fields.iter().any(|field| field.id == field_id)
    }
}

/// Partitions `active` into one step per category, in the schema's category order.
///
/// Categories without active fields are dropped, except the schedule category, which always
/// carries the schedule editor. Indices are renumbered so they stay contiguous from 1.
pub fn group_steps(schema: &FieldSchema, active: &[FieldDefinition]) -> Vec<Step> {
    for field in active {
        if schema.category(field.category).is_none() {
            tracing::warn!(
                kind = %schema.kind,
                field_id = field.id,
                category = field.category,
                "active field belongs to no wizard category"
            );
        }
    }

    let mut steps = Vec::with_capacity(schema.categories.len());
    for category in schema.categories {
        let fields: Vec<FieldDefinition> = active
            .iter()
            .filter(|field| field.category == category.id)
            .copied()
            .collect();
        let schedule = schema.schedule_category == Some(category.id);

        if fields.is_empty() && !schedule {
            continue;
        }

        steps.push(Step {
            index: steps.len() + 1,
            title: category.title,
            category: category.id,
            fields,
            schedule,
        });
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::resolve_active_fields;
    use crate::fields::tests::SCENARIO_SCHEMA;
    use crate::schema::{DOCTOR_SCHEMA, PATIENT_SCHEMA};
    use crate::visibility::VisibilityConfig;

    #[test]
    fn test_scenario_groups_into_two_steps() {
        let mut config = VisibilityConfig::new();
        config.set("notes", false);
        let active = resolve_active_fields(&SCENARIO_SCHEMA, Some(&config));

        let steps = group_steps(&SCENARIO_SCHEMA, &active);

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].index, 1);
        assert_eq!(steps[0].category, "A");
        assert_eq!(steps[0].fields.iter().map(|f| f.id).collect::<Vec<_>>(), ["name"]);
        assert_eq!(steps[1].index, 2);
        assert_eq!(steps[1].category, "B");
        assert_eq!(steps[1].fields.iter().map(|f| f.id).collect::<Vec<_>>(), ["license"]);
        assert!(steps.iter().all(|step| !step.schedule));
    }

    #[test]
    fn test_empty_categories_are_dropped_and_indices_stay_contiguous() {
        let active = resolve_active_fields(&PATIENT_SCHEMA, Some(&VisibilityConfig::new()));

        let steps = group_steps(&PATIENT_SCHEMA, &active);

        let categories: Vec<_> = steps.iter().map(|step| step.category).collect();
        assert_eq!(categories, ["personal", "contact"]);
        let indices: Vec<_> = steps.iter().map(|step| step.index).collect();
        assert_eq!(indices, [1, 2]);
        assert_eq!(steps[0].title, "Personal Information");
    }

    #[test]
    fn test_doctor_schedule_step_is_kept_without_fields() {
        let active = resolve_active_fields(&DOCTOR_SCHEMA, Some(&VisibilityConfig::new()));

        let steps = group_steps(&DOCTOR_SCHEMA, &active);

        let last = steps.last().expect("doctor form has steps");
        assert_eq!(last.category, "availability");
        assert!(last.schedule);
        assert!(last.fields.is_empty());
        assert_eq!(steps.iter().filter(|step| step.schedule).count(), 1);
    }

    #[test]
    fn test_schedule_step_keeps_its_enabled_fields() {
        let mut config = VisibilityConfig::new();
        config.set("consultation_duration", true);
        let active = resolve_active_fields(&DOCTOR_SCHEMA, Some(&config));

        let steps = group_steps(&DOCTOR_SCHEMA, &active);
        let schedule_step = steps.iter().find(|step| step.schedule).expect("schedule step");
        assert!(schedule_step.contains_field("consultation_duration"));
    }
}
