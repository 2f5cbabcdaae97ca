//! Field-visibility configuration.
//!
//! Administrators decide which optional fields appear on the patient and doctor forms. The
//! decision is a `fieldId → enabled` map per entity kind, persisted through the
//! [`RecordStore`] and shared by every open form.
//!
//! [`VisibilityStore`] owns the in-memory copy. It is loaded lazily per kind, refreshed only by
//! an explicit [`reload`](VisibilityStore::reload), and changed only through
//! [`toggle`](VisibilityStore::toggle), which writes to the store before touching the cache.
//! Toggles and reloads are serialised, so the cache always holds the last map written.

use crate::error::{ConfigLockError, PersistenceError, StoreOperation, ToggleError};
use crate::repositories::RecordStore;
use crate::schema::{EntityKind, FieldSchema, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Stored enabled flags for one entity kind.
///
/// A field missing from the map counts as disabled. Mandatory fields are shown regardless of
/// what the map says.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityConfig(BTreeMap<String, bool>);

impl VisibilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{f.id: f.mandatory}` for every field in the schema.
    pub fn defaults_for(schema: &FieldSchema) -> Self {
        schema
            .fields
            .iter()
            .map(|field| (field.id.to_string(), field.mandatory))
            .collect()
    }

    pub fn get(&self, field_id: &str) -> Option<bool> {
        self.0.get(field_id).copied()
    }

    pub fn is_enabled(&self, field_id: &str) -> bool {
        self.get(field_id).unwrap_or(false)
    }

    pub fn set(&mut self, field_id: impl Into<String>, enabled: bool) {
        self.0.insert(field_id.into(), enabled);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, enabled)| (id.as_str(), *enabled))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forces every mandatory field to `true`. Applied to maps before they are written.
    fn with_mandatory_enabled(mut self, schema: &FieldSchema) -> Self {
        for field in schema.mandatory_fields() {
            self.set(field.id, true);
        }
        self
    }
}

impl FromIterator<(String, bool)> for VisibilityConfig {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of a toggle that reached a decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The new configuration, already persisted.
    Applied(VisibilityConfig),
    /// Nothing changed.
    Rejected(ConfigLockError),
}

/// Process-wide visibility configuration with a per-kind cache.
#[derive(Debug)]
pub struct VisibilityStore<S> {
    store: Arc<S>,
    registry: SchemaRegistry,
    cache: RwLock<HashMap<EntityKind, VisibilityConfig>>,
    updates: Mutex<()>,
}

impl<S: RecordStore> VisibilityStore<S> {
    pub fn new(store: Arc<S>, registry: SchemaRegistry) -> Self {
        Self {
            store,
            registry,
            cache: RwLock::new(HashMap::new()),
            updates: Mutex::new(()),
        }
    }

    /// The loaded configuration for `kind`, without touching the store.
    pub fn cached(&self, kind: EntityKind) -> Option<VisibilityConfig> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    fn remember(&self, kind: EntityKind, config: VisibilityConfig) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, config);
    }

    /// Caches `config` unless a newer copy got there first; returns whichever is cached.
    fn remember_if_absent(&self, kind: EntityKind, config: VisibilityConfig) -> VisibilityConfig {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_insert(config)
            .clone()
    }

    fn forget(&self, kind: EntityKind) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
    }

    /// Returns the configuration for `kind`, reading the store on first use.
    ///
    /// When nothing is stored the schema defaults are returned (and cached) but not written;
    /// the first toggle persists them.
    pub async fn load(&self, kind: EntityKind) -> Result<VisibilityConfig, PersistenceError> {
        if let Some(config) = self.cached(kind) {
            return Ok(config);
        }

        let stored = self
            .store
            .load_visibility(kind)
            .await
            .map_err(|source| PersistenceError::new(StoreOperation::LoadVisibility, source))?;

        let config = match stored {
            Some(config) => config,
            None => {
                tracing::debug!(%kind, "no stored visibility configuration, using defaults");
                VisibilityConfig::defaults_for(self.registry.schema(kind))
            }
        };

        Ok(self.remember_if_absent(kind, config))
    }

    /// Drops the cached copy and loads again from the store.
    pub async fn reload(&self, kind: EntityKind) -> Result<VisibilityConfig, PersistenceError> {
        let _guard = self.updates.lock().await;
        self.forget(kind);
        self.load(kind).await
    }

    /// Flips one optional field's enabled flag and persists the whole map.
    ///
    /// Mandatory fields are always active and cannot be toggled; the attempt is reported as
    /// [`ToggleOutcome::Rejected`] and nothing is written. The cache only changes after the
    /// store confirms the write, so on failure the previous configuration stays in effect and
    /// is handed back in [`ToggleError::Persistence`].
    ///
    /// Concurrent toggles run one at a time, each starting from the map the previous one wrote,
    /// so the last write wins without dropping earlier flips.
    pub async fn toggle(
        &self,
        kind: EntityKind,
        field_id: &str,
    ) -> Result<ToggleOutcome, ToggleError> {
        let schema = self.registry.schema(kind);
        let field = schema
            .field(field_id)
            .ok_or_else(|| ToggleError::UnknownField {
                kind,
                field_id: field_id.to_string(),
            })?;

        if field.mandatory {
            tracing::info!(%kind, field_id, "refusing to disable mandatory field");
            return Ok(ToggleOutcome::Rejected(ConfigLockError::MandatoryLocked {
                field_id: field.id,
            }));
        }

        let _guard = self.updates.lock().await;
        let previous = self.load(kind).await.map_err(ToggleError::Load)?;
        let enabled = !previous.is_enabled(field.id);
        let mut next = previous.clone().with_mandatory_enabled(schema);
        next.set(field.id, enabled);

        if let Err(source) = self.store.save_visibility(kind, &next).await {
            tracing::warn!(%kind, field_id, error = %source, "visibility toggle not persisted");
            return Err(ToggleError::Persistence {
                previous,
                source: PersistenceError::new(StoreOperation::SaveVisibility, source),
            });
        }

        tracing::info!(%kind, field_id, enabled, "field visibility updated");
        self.remember(kind, next.clone());
        Ok(ToggleOutcome::Applied(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::repositories::file::FileStore;
    use crate::repositories::memory::MemoryStore;
    use crate::schema::PATIENT_SCHEMA;

    fn visibility(store: &Arc<MemoryStore>) -> VisibilityStore<MemoryStore> {
        VisibilityStore::new(store.clone(), SchemaRegistry::builtin())
    }

    #[test]
    fn test_defaults_enable_exactly_the_mandatory_fields() {
        let defaults = VisibilityConfig::defaults_for(&PATIENT_SCHEMA);
        assert_eq!(defaults.len(), PATIENT_SCHEMA.fields.len());
        for field in PATIENT_SCHEMA.fields {
            assert_eq!(defaults.get(field.id), Some(field.mandatory), "{}", field.id);
        }
    }

    #[tokio::test]
    async fn test_load_without_stored_config_returns_defaults_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);

        let config = visibility
            .load(EntityKind::Patient)
            .await
            .expect("load should succeed");

        assert_eq!(config, VisibilityConfig::defaults_for(&PATIENT_SCHEMA));
        assert_eq!(store.calls(StoreOperation::SaveVisibility), 0);
        assert!(store
            .stored_visibility(EntityKind::Patient)
            .is_none());
    }

    #[tokio::test]
    async fn test_load_uses_cache_until_reload() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);

        visibility.load(EntityKind::Doctor).await.expect("load");
        visibility.load(EntityKind::Doctor).await.expect("load");
        assert_eq!(store.calls(StoreOperation::LoadVisibility), 1);

        let mut edited = VisibilityConfig::new();
        edited.set("department", true);
        store.seed_visibility(EntityKind::Doctor, edited.clone());

        let reloaded = visibility.reload(EntityKind::Doctor).await.expect("reload");
        assert_eq!(reloaded, edited);
        assert_eq!(store.calls(StoreOperation::LoadVisibility), 2);
    }

    #[tokio::test]
    async fn test_toggle_mandatory_field_is_rejected_and_not_written() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);

        let outcome = visibility
            .toggle(EntityKind::Patient, "first_name")
            .await
            .expect("toggle should reach a decision");

        assert_eq!(
            outcome,
            ToggleOutcome::Rejected(ConfigLockError::MandatoryLocked {
                field_id: "first_name"
            })
        );
        assert_eq!(store.calls(StoreOperation::SaveVisibility), 0);
        assert!(store.stored_visibility(EntityKind::Patient).is_none());
    }

    #[tokio::test]
    async fn test_toggle_mandatory_field_rejected_even_when_stored_false() {
        let store = Arc::new(MemoryStore::new());
        let mut stale = VisibilityConfig::new();
        stale.set("phone", false);
        store.seed_visibility(EntityKind::Patient, stale.clone());
        let visibility = visibility(&store);

        let outcome = visibility
            .toggle(EntityKind::Patient, "phone")
            .await
            .expect("toggle should reach a decision");

        assert!(matches!(outcome, ToggleOutcome::Rejected(_)));
        assert_eq!(store.stored_visibility(EntityKind::Patient), Some(stale));
    }

    #[tokio::test]
    async fn test_toggle_optional_field_flips_and_persists_full_map() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);

        let ToggleOutcome::Applied(config) = visibility
            .toggle(EntityKind::Patient, "allergies")
            .await
            .expect("toggle should succeed")
        else {
            panic!("optional field toggle should apply");
        };

        assert!(config.is_enabled("allergies"));
        assert!(config.is_enabled("first_name"));
        assert_eq!(config.len(), PATIENT_SCHEMA.fields.len());
        assert_eq!(store.stored_visibility(EntityKind::Patient), Some(config.clone()));
        assert_eq!(visibility.cached(EntityKind::Patient), Some(config));

        let ToggleOutcome::Applied(config) = visibility
            .toggle(EntityKind::Patient, "allergies")
            .await
            .expect("second toggle should succeed")
        else {
            panic!("optional field toggle should apply");
        };
        assert!(!config.is_enabled("allergies"));
    }

    #[tokio::test]
    async fn test_toggle_write_corrects_stale_mandatory_false() {
        let store = Arc::new(MemoryStore::new());
        let mut stale = VisibilityConfig::new();
        stale.set("last_name", false);
        store.seed_visibility(EntityKind::Patient, stale);
        let visibility = visibility(&store);

        visibility
            .toggle(EntityKind::Patient, "city")
            .await
            .expect("toggle should succeed");

        let stored = store
            .stored_visibility(EntityKind::Patient)
            .expect("map should be stored");
        assert_eq!(stored.get("last_name"), Some(true));
        assert_eq!(stored.get("city"), Some(true));
    }

    #[tokio::test]
    async fn test_toggle_failure_keeps_previous_configuration() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);
        let before = visibility.load(EntityKind::Patient).await.expect("load");

        store.fail_next(StoreOperation::SaveVisibility);
        let err = visibility
            .toggle(EntityKind::Patient, "occupation")
            .await
            .expect_err("toggle should fail");

        match err {
            ToggleError::Persistence { previous, source } => {
                assert_eq!(previous, before);
                assert_eq!(source.operation, StoreOperation::SaveVisibility);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(visibility.cached(EntityKind::Patient), Some(before));
        assert!(store.stored_visibility(EntityKind::Patient).is_none());
    }

    #[tokio::test]
    async fn test_toggle_unknown_field_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let visibility = visibility(&store);

        let err = visibility
            .toggle(EntityKind::Doctor, "shoe_size")
            .await
            .expect_err("unknown field should fail");
        assert!(matches!(err, ToggleError::UnknownField { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_against_files_keep_cache_and_disk_in_step() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let cfg =
            CoreConfig::new(temp_dir.path().to_path_buf(), "test.clinic").expect("valid config");
        let store = Arc::new(FileStore::new(Arc::new(cfg)));
        let visibility = Arc::new(VisibilityStore::new(store.clone(), SchemaRegistry::builtin()));

        let optional: Vec<&'static str> = PATIENT_SCHEMA
            .fields
            .iter()
            .filter(|field| !field.mandatory)
            .map(|field| field.id)
            .take(8)
            .collect();
        assert_eq!(optional.len(), 8);

        for _ in 0..5 {
            let mut tasks = Vec::new();
            for field_id in &optional {
                let visibility = visibility.clone();
                let field_id = *field_id;
                tasks.push(tokio::spawn(async move {
                    visibility.toggle(EntityKind::Patient, field_id).await
                }));
            }
            for task in tasks {
                let outcome = task
                    .await
                    .expect("task should not panic")
                    .expect("toggle should be persisted");
                assert!(matches!(outcome, ToggleOutcome::Applied(_)));
            }

            let on_disk = store
                .load_visibility(EntityKind::Patient)
                .await
                .expect("load")
                .expect("a map should be stored");
            assert_eq!(visibility.cached(EntityKind::Patient), Some(on_disk));
        }

        // Five flips each: every field ends up enabled.
        let cached = visibility.cached(EntityKind::Patient).expect("cached");
        for field_id in &optional {
            assert!(cached.is_enabled(field_id), "{field_id}");
        }
    }
}
