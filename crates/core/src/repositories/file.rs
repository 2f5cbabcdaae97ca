//! Local-disk record store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   config/
//!     <namespace>.<kind>.json        # visibility map, one file per entity kind
//!   records/
//!     <kind>/<s1>/<s2>/<id>/
//!       record.yaml                  # entity record
//!   schedules/
//!     <owner_id>.json                # every schedule row for one owner
//! ```
//!
//! Record ids are canonical UUIDs (see [`RecordId`]), which also makes them safe to use as
//! path components. Files are written to a uniquely named temporary sibling and renamed into
//! place. Mutations hold a store-wide write lock, so read-modify-write updates of one file never
//! interleave.

use super::{EntityPayload, EntityRecord, RecordStore, StoreResult};
use crate::config::CoreConfig;
use crate::constants::RECORD_FILENAME;
use crate::error::StoreError;
use crate::record_id::RecordId;
use crate::schedule::ScheduleRow;
use crate::schema::EntityKind;
use crate::visibility::VisibilityConfig;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A [`RecordStore`] backed by files under the configured data directory.
///
/// Clones share the write lock.
#[derive(Clone, Debug)]
pub struct FileStore {
    cfg: Arc<CoreConfig>,
    writes: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn visibility_path(&self, kind: EntityKind) -> PathBuf {
        self.cfg
            .config_dir()
            .join(format!("{}.json", self.cfg.config_key(kind)))
    }

    fn record_path(&self, kind: EntityKind, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.cfg.records_dir(kind))
            .join(RECORD_FILENAME)
    }

    fn schedule_path(&self, owner: &RecordId) -> PathBuf {
        self.cfg.schedules_dir().join(format!("{owner}.json"))
    }

    async fn read_record(&self, path: &Path) -> StoreResult<Option<EntityRecord>> {
        match read_optional(path).await? {
            Some(contents) => Ok(Some(serde_yaml::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn write_record(&self, record: &EntityRecord) -> StoreResult<()> {
        let id = RecordId::parse(&record.id)?;
        let path = self.record_path(record.kind, &id);
        let contents = serde_yaml::to_string(record)?;
        write_atomic(&path, contents.as_bytes()).await
    }

    async fn read_owner_rows(&self, owner: &RecordId) -> StoreResult<Vec<ScheduleRow>> {
        match read_optional(&self.schedule_path(owner)).await? {
            Some(contents) => Ok(serde_json::from_str(&contents)?),
            None => Ok(Vec::new()),
        }
    }

    /// Every `record.yaml` under `records/<kind>/<s1>/<s2>/<id>/`.
    async fn record_files(&self, kind: EntityKind) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for s1 in subdirectories(&self.cfg.records_dir(kind)).await? {
            for s2 in subdirectories(&s1).await? {
                for record_dir in subdirectories(&s2).await? {
                    let path = record_dir.join(RECORD_FILENAME);
                    if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                        files.push(path);
                    }
                }
            }
        }
        Ok(files)
    }
}

impl RecordStore for FileStore {
    async fn load_visibility(&self, kind: EntityKind) -> StoreResult<Option<VisibilityConfig>> {
        match read_optional(&self.visibility_path(kind)).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn save_visibility(&self, kind: EntityKind, config: &VisibilityConfig) -> StoreResult<()> {
        let contents = serde_json::to_vec_pretty(config)?;
        let _guard = self.writes.lock().await;
        write_atomic(&self.visibility_path(kind), &contents).await?;
        tracing::debug!(%kind, "visibility configuration saved");
        Ok(())
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        payload: &EntityPayload,
    ) -> StoreResult<EntityRecord> {
        let now = Utc::now();
        let record = EntityRecord {
            id: RecordId::new().to_string(),
            kind,
            fields: payload.clone(),
            created_at: now,
            updated_at: now,
        };
        let _guard = self.writes.lock().await;
        self.write_record(&record).await?;
        tracing::debug!(%kind, id = %record.id, "record created");
        Ok(record)
    }

    async fn update_entity(
        &self,
        kind: EntityKind,
        id: &str,
        payload: &EntityPayload,
    ) -> StoreResult<EntityRecord> {
        let record_id = RecordId::parse(id)?;
        let _guard = self.writes.lock().await;
        let mut record = self
            .read_record(&self.record_path(kind, &record_id))
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;

        record
            .fields
            .extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
        record.updated_at = Utc::now();
        self.write_record(&record).await?;
        tracing::debug!(%kind, id, "record updated");
        Ok(record)
    }

    async fn get_entity(&self, kind: EntityKind, id: &str) -> StoreResult<Option<EntityRecord>> {
        let record_id = RecordId::parse(id)?;
        self.read_record(&self.record_path(kind, &record_id)).await
    }

    /// Records that fail to parse are logged and skipped.
    async fn list_entities(&self, kind: EntityKind) -> StoreResult<Vec<EntityRecord>> {
        let mut records = Vec::new();
        for path in self.record_files(kind).await? {
            match self.read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("failed to parse record {}: {}", path.display(), e);
                }
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn delete_schedule(&self, owner_id: &str) -> StoreResult<()> {
        let owner = RecordId::parse(owner_id)?;
        let _guard = self.writes.lock().await;
        match fs::remove_file(self.schedule_path(&owner)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_schedule(&self, rows: &[ScheduleRow]) -> StoreResult<()> {
        let mut by_owner: BTreeMap<&str, Vec<&ScheduleRow>> = BTreeMap::new();
        for row in rows {
            by_owner.entry(row.owner_id.as_str()).or_default().push(row);
        }

        let _guard = self.writes.lock().await;
        for (owner_id, new_rows) in by_owner {
            let owner = RecordId::parse(owner_id)?;
            let mut stored = self.read_owner_rows(&owner).await?;
            stored.extend(new_rows.into_iter().cloned());
            let contents = serde_json::to_vec_pretty(&stored)?;
            write_atomic(&self.schedule_path(&owner), &contents).await?;
        }
        Ok(())
    }

    async fn list_schedule(
        &self,
        owner_ids: Option<&BTreeSet<String>>,
    ) -> StoreResult<Vec<ScheduleRow>> {
        let owners: Vec<RecordId> = match owner_ids {
            Some(ids) => ids
                .iter()
                .map(|id| RecordId::parse(id))
                .collect::<StoreResult<_>>()?,
            None => schedule_owners(&self.cfg.schedules_dir()).await?,
        };

        let mut rows = Vec::new();
        for owner in &owners {
            rows.extend(self.read_owner_rows(owner).await?);
        }
        Ok(rows)
    }
}

async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes `contents` to a fresh temporary sibling of `path`, then renames it over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Immediate sub-directories of `dir`; a missing `dir` has none.
async fn subdirectories(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Owners with a schedule file; unrelated files are ignored.
async fn schedule_owners(dir: &Path) -> StoreResult<Vec<RecordId>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut owners = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        match RecordId::parse(stem) {
            Ok(owner) => owners.push(owner),
            Err(_) => tracing::warn!("ignoring unexpected schedule file {}", path.display()),
        }
    }
    owners.sort_by_key(|owner| owner.to_string());
    Ok(owners)
}
