//! Active-field resolution: which fields a form instance shows.

use crate::schema::{FieldDefinition, FieldSchema};
use crate::visibility::VisibilityConfig;

/// Whether `field` is shown under `config`.
///
/// Mandatory fields are always active, whatever the stored map says. With no configuration
/// loaded the schema's essential fields are shown as well, so the form is usable before the
/// store answers.
pub fn is_active(
    schema: &FieldSchema,
    field: &FieldDefinition,
    config: Option<&VisibilityConfig>,
) -> bool {
    if field.mandatory {
        return true;
    }
    match config {
        Some(config) => config.is_enabled(field.id),
        None => schema.is_essential(field.id),
    }
}

/// The active fields of `schema`, in registry order.
pub fn resolve_active_fields(
    schema: &FieldSchema,
    config: Option<&VisibilityConfig>,
) -> Vec<FieldDefinition> {
    schema
        .fields
        .iter()
        .filter(|field| is_active(schema, field, config))
        .copied()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::{Category, EntityKind, FieldKind, PATIENT_SCHEMA};
    use proptest::prelude::*;

    pub(crate) static SCENARIO_SCHEMA: FieldSchema = FieldSchema {
        kind: EntityKind::Patient,
        fields: &[
            FieldDefinition::new("name", "Name", FieldKind::Text, "A").required(),
            FieldDefinition::new("license", "License", FieldKind::Text, "B").required(),
            FieldDefinition::new("notes", "Notes", FieldKind::Textarea, "B"),
        ],
        categories: &[
            Category {
                id: "A",
                title: "Category A",
            },
            Category {
                id: "B",
                title: "Category B",
            },
        ],
        essentials: &["notes"],
        schedule_category: None,
    };

    fn ids(fields: &[FieldDefinition]) -> Vec<&'static str> {
        fields.iter().map(|field| field.id).collect()
    }

    #[test]
    fn test_disabled_optional_field_is_excluded() {
        let mut config = VisibilityConfig::new();
        config.set("notes", false);

        let active = resolve_active_fields(&SCENARIO_SCHEMA, Some(&config));
        assert_eq!(ids(&active), vec!["name", "license"]);
    }

    #[test]
    fn test_mandatory_fields_survive_stored_false() {
        let config: VisibilityConfig = PATIENT_SCHEMA
            .fields
            .iter()
            .map(|field| (field.id.to_string(), false))
            .collect();

        let active = resolve_active_fields(&PATIENT_SCHEMA, Some(&config));
        let mandatory: Vec<_> = PATIENT_SCHEMA.mandatory_fields().map(|f| f.id).collect();
        assert_eq!(ids(&active), mandatory);
    }

    #[test]
    fn test_empty_loaded_config_yields_only_mandatory_fields() {
        let active = resolve_active_fields(&PATIENT_SCHEMA, Some(&VisibilityConfig::new()));
        assert!(active.iter().all(|field| field.mandatory));
        assert_eq!(active.len(), PATIENT_SCHEMA.mandatory_fields().count());
    }

    #[test]
    fn test_missing_config_falls_back_to_essentials() {
        let active = resolve_active_fields(&PATIENT_SCHEMA, None);

        for field in PATIENT_SCHEMA.fields {
            let expected = field.mandatory || PATIENT_SCHEMA.is_essential(field.id);
            assert_eq!(active.contains(field), expected, "{}", field.id);
        }
        assert!(ids(&active).contains(&"email"));
    }

    #[test]
    fn test_enabled_fields_keep_registry_order() {
        let mut config = VisibilityConfig::new();
        config.set("weight_kg", true);
        config.set("occupation", true);

        let active = resolve_active_fields(&PATIENT_SCHEMA, Some(&config));
        let occupation = active.iter().position(|f| f.id == "occupation");
        let phone = active.iter().position(|f| f.id == "phone");
        let weight = active.iter().position(|f| f.id == "weight_kg");
        assert!(occupation < phone && phone < weight);
    }

    const POOL: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

    /// A leaked schema over `POOL` with the given mandatory and essential flags.
    fn arb_schema() -> impl Strategy<Value = &'static FieldSchema> {
        (
            prop::collection::vec(any::<bool>(), POOL.len()),
            prop::collection::vec(any::<bool>(), POOL.len()),
        )
            .prop_map(|(mandatory, essential)| {
                let fields: Vec<FieldDefinition> = POOL
                    .iter()
                    .zip(&mandatory)
                    .map(|(id, required)| {
                        let field = FieldDefinition::new(*id, *id, FieldKind::Text, "A");
                        if *required {
                            field.required()
                        } else {
                            field
                        }
                    })
                    .collect();
                let essentials: Vec<&'static str> = POOL
                    .iter()
                    .zip(&essential)
                    .filter(|(_, keep)| **keep)
                    .map(|(id, _)| *id)
                    .collect();
                &*Box::leak(Box::new(FieldSchema {
                    kind: EntityKind::Patient,
                    fields: Box::leak(fields.into_boxed_slice()),
                    categories: &[Category {
                        id: "A",
                        title: "Category A",
                    }],
                    essentials: Box::leak(essentials.into_boxed_slice()),
                    schedule_category: None,
                }))
            })
    }

    fn arb_config() -> impl Strategy<Value = Option<VisibilityConfig>> {
        prop::option::of(
            prop::collection::btree_map(prop::sample::select(POOL.to_vec()), any::<bool>(), 0..6)
                .prop_map(|map| {
                    map.into_iter()
                        .map(|(id, enabled)| (id.to_string(), enabled))
                        .collect::<VisibilityConfig>()
                }),
        )
    }

    proptest! {
        #[test]
        fn active_iff_mandatory_or_enabled(schema in arb_schema(), config in arb_config()) {
            let active = resolve_active_fields(schema, config.as_ref());

            for field in schema.fields {
                let expected = field.mandatory
                    || match &config {
                        Some(config) => config.is_enabled(field.id),
                        None => schema.is_essential(field.id),
                    };
                prop_assert_eq!(active.contains(field), expected, "{}", field.id);
            }

            let positions: Vec<usize> = active
                .iter()
                .filter_map(|field| schema.fields.iter().position(|f| f == field))
                .collect();
            prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
