//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to the
//! helpers here; nothing in the core reads the environment during request handling.

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_CONFIG_NAMESPACE, DEFAULT_DATA_DIR, RECORDS_DIR_NAME,
    SCHEDULES_DIR_NAME,
};
use crate::schema::EntityKind;
use crate::validation::validate_config_namespace;
use crate::ClinicResult;
use clinic_types::NonEmptyText;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    config_namespace: NonEmptyText,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`](crate::ClinicError::InvalidInput) if the namespace
    /// is empty or contains characters that are unsafe in a file name.
    pub fn new(data_dir: PathBuf, config_namespace: &str) -> ClinicResult<Self> {
        validate_config_namespace(config_namespace)?;

        Ok(Self {
            data_dir,
            config_namespace: NonEmptyText::new(config_namespace)?,
        })
    }

    /// Build a configuration from optional raw environment values, applying defaults.
    pub fn from_env_values(
        data_dir: Option<String>,
        config_namespace: Option<String>,
    ) -> ClinicResult<Self> {
        let data_dir = non_blank(data_dir).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let namespace =
            non_blank(config_namespace).unwrap_or_else(|| DEFAULT_CONFIG_NAMESPACE.to_string());
        Self::new(PathBuf::from(data_dir), &namespace)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_namespace(&self) -> &str {
        self.config_namespace.as_str()
    }

    /// The persisted key for one entity kind's visibility configuration: `{namespace}.{kind}`.
    pub fn config_key(&self, kind: EntityKind) -> String {
        format!("{}.{}", self.config_namespace, kind)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.data_dir.join(CONFIG_DIR_NAME)
    }

    pub fn records_dir(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(RECORDS_DIR_NAME).join(kind.as_str())
    }

    pub fn schedules_dir(&self) -> PathBuf {
        self.data_dir.join(SCHEDULES_DIR_NAME)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
