//! Completeness rules deciding whether a step may be left forwards, or the form saved.
//!
//! Checks run in a fixed order so the reported failure is reproducible: missing mandatory
//! fields in step order, then malformed values in step order, then schedule days Monday
//! through Sunday.

use crate::draft::EntityDraft;
use crate::error::ValidationError;
use crate::schedule::DayStatus;
use crate::steps::Step;
use crate::validation::{check_field_value, parse_time_of_day};

/// Validates one step of `draft`, returning the first problem found.
pub fn validate_step(step: &Step, draft: &EntityDraft) -> Result<(), ValidationError> {
    if let Some(field) = step
        .mandatory_fields()
        .find(|field| draft.present(field.id).is_none())
    {
        return Err(ValidationError::MissingField { field: *field });
    }

    for field in &step.fields {
        let Some(value) = draft.present(field.id) else {
            continue;
        };
        if let Err(reason) = check_field_value(&field.kind, value.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: *field,
                reason,
            });
        }
    }

    if step.schedule {
        validate_schedule(draft)?;
    }

    Ok(())
}

/// Validates every step in order, returning the index of the first failing one.
pub fn validate_steps(steps: &[Step], draft: &EntityDraft) -> Result<(), (usize, ValidationError)> {
    for step in steps {
        validate_step(step, draft).map_err(|error| (step.index, error))?;
    }
    Ok(())
}

/// Off days always pass; a doctor may be unavailable all week. Hours are not ordered, so a
/// slot ending before it starts is an overnight shift.
fn validate_schedule(draft: &EntityDraft) -> Result<(), ValidationError> {
    let Some(schedule) = draft.schedule() else {
        return Ok(());
    };

    if let Some(day) = schedule.first_half_filled() {
        return Err(ValidationError::HalfFilledDay { day });
    }

    for (day, slot) in schedule.iter() {
        if slot.status() != DayStatus::Complete {
            continue;
        }
        if parse_time_of_day(&slot.start).is_none() || parse_time_of_day(&slot.end).is_none() {
            return Err(ValidationError::InvalidHours {
                day,
                reason: "times must be in HH:MM format",
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::resolve_active_fields;
    use crate::fields::tests::SCENARIO_SCHEMA;
    use crate::schedule::{DayOfWeek, DaySlot};
    use crate::schema::{DOCTOR_SCHEMA, PATIENT_SCHEMA};
    use crate::steps::group_steps;
    use crate::visibility::VisibilityConfig;

    fn patient_steps() -> Vec<Step> {
        let active = resolve_active_fields(&PATIENT_SCHEMA, Some(&VisibilityConfig::new()));
        group_steps(&PATIENT_SCHEMA, &active)
    }

    fn doctor_schedule_step() -> Step {
        let active = resolve_active_fields(&DOCTOR_SCHEMA, Some(&VisibilityConfig::new()));
        group_steps(&DOCTOR_SCHEMA, &active)
            .into_iter()
            .find(|step| step.schedule)
            .expect("doctor has a schedule step")
    }

    fn complete_personal(draft: &mut EntityDraft) {
        draft.set("first_name", Some("Kofi".into()));
        draft.set("last_name", Some("Boateng".into()));
        draft.set("date_of_birth", Some("1984-03-09".into()));
        draft.set("gender", Some("Male".into()));
    }

    #[test]
    fn test_reports_first_missing_field_in_step_order() {
        let steps = patient_steps();
        let mut draft = EntityDraft::new(&PATIENT_SCHEMA);
        draft.set("first_name", Some("Kofi".into()));

        let err = validate_step(&steps[0], &draft).expect_err("should fail");
        assert_eq!(err.field().map(|f| f.id), Some("last_name"));

        let empty = EntityDraft::new(&PATIENT_SCHEMA);
        let err = validate_step(&steps[0], &empty).expect_err("should fail");
        assert!(matches!(err, ValidationError::MissingField { field } if field.id == "first_name"));
    }

    #[test]
    fn test_whitespace_and_null_count_as_missing() {
        let steps = patient_steps();
        let mut draft = EntityDraft::new(&PATIENT_SCHEMA);
        complete_personal(&mut draft);
        draft.set("first_name", Some(" \t ".into()));
        assert!(validate_step(&steps[0], &draft).is_err());

        draft.set("first_name", None);
        assert!(validate_step(&steps[0], &draft).is_err());

        draft.set("first_name", Some("Kofi".into()));
        assert!(validate_step(&steps[0], &draft).is_ok());
    }

    #[test]
    fn test_malformed_value_fails_after_presence() {
        let steps = patient_steps();
        let mut draft = EntityDraft::new(&PATIENT_SCHEMA);
        complete_personal(&mut draft);
        draft.set("date_of_birth", Some("09/03/1984".into()));

        let err = validate_step(&steps[0], &draft).expect_err("should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidValue { field, .. } if field.id == "date_of_birth"
        ));

        draft.set("gender", None);
        let err = validate_step(&steps[0], &draft).expect_err("should fail");
        assert!(matches!(err, ValidationError::MissingField { field } if field.id == "gender"));
    }

    #[test]
    fn test_scenario_save_with_blank_name_fails_step_a() {
        let mut config = VisibilityConfig::new();
        config.set("notes", false);
        let active = resolve_active_fields(&SCENARIO_SCHEMA, Some(&config));
        let steps = group_steps(&SCENARIO_SCHEMA, &active);

        let mut draft = EntityDraft::new(&SCENARIO_SCHEMA);
        draft.set("name", Some(String::new()));
        draft.set("license", Some("MDC-2291".into()));

        let (step, err) = validate_steps(&steps, &draft).expect_err("save must be refused");
        assert_eq!(step, 1);
        assert_eq!(err.field().map(|f| f.id), Some("name"));
    }

    #[test]
    fn test_half_filled_day_fails_and_off_day_passes() {
        let step = doctor_schedule_step();
        let mut draft = EntityDraft::new(&DOCTOR_SCHEMA);

        assert!(validate_step(&step, &draft).is_ok(), "all days off is accepted");

        let schedule = draft.schedule_mut().expect("doctor draft has a schedule");
        schedule.set(DayOfWeek::Tuesday, DaySlot::new("09:00", ""));
        schedule.set(DayOfWeek::Thursday, DaySlot::new("", "12:00"));

        let err = validate_step(&step, &draft).expect_err("half-filled day must fail");
        assert_eq!(err, ValidationError::HalfFilledDay { day: DayOfWeek::Tuesday });
        assert_eq!(err.day(), Some(DayOfWeek::Tuesday));
    }

    #[test]
    fn test_complete_day_needs_parseable_hours() {
        let step = doctor_schedule_step();
        let mut draft = EntityDraft::new(&DOCTOR_SCHEMA);
        let schedule = draft.schedule_mut().expect("schedule");
        schedule.set(DayOfWeek::Monday, DaySlot::new("09:00", "17:00"));
        assert!(validate_step(&step, &draft).is_ok());

        let schedule = draft.schedule_mut().expect("schedule");
        schedule.set(DayOfWeek::Friday, DaySlot::new("nine", "five"));
        let err = validate_step(&step, &draft).expect_err("unparseable hours must fail");
        assert!(matches!(
            err,
            ValidationError::InvalidHours { day: DayOfWeek::Friday, .. }
        ));
    }

    #[test]
    fn test_overnight_day_is_accepted() {
        let step = doctor_schedule_step();
        let mut draft = EntityDraft::new(&DOCTOR_SCHEMA);
        let schedule = draft.schedule_mut().expect("schedule");
        schedule.set(DayOfWeek::Monday, DaySlot::new("22:00", "06:00"));
        schedule.set(DayOfWeek::Saturday, DaySlot::new("08:00", "08:00"));

        assert!(validate_step(&step, &draft).is_ok());
    }

    #[test]
    fn test_non_schedule_step_ignores_schedule() {
        let active = resolve_active_fields(&DOCTOR_SCHEMA, Some(&VisibilityConfig::new()));
        let steps = group_steps(&DOCTOR_SCHEMA, &active);
        let mut draft = EntityDraft::new(&DOCTOR_SCHEMA);
        draft.set("first_name", Some("Efua".into()));
        draft.set("last_name", Some("Asante".into()));
        draft
            .schedule_mut()
            .expect("schedule")
            .set(DayOfWeek::Monday, DaySlot::new("09:00", ""));

        assert!(validate_step(&steps[0], &draft).is_ok());
    }
}
