//! Constants used throughout the clinic core crate.
//!
//! Path and filename constants live here so the file store and the configuration agree on the
//! on-disk layout.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Default namespace prefixed to persisted configuration keys.
pub const DEFAULT_CONFIG_NAMESPACE: &str = "clinic";

/// Directory name for persisted field-visibility configuration.
pub const CONFIG_DIR_NAME: &str = "config";

/// Directory name for entity records (one sub-directory per entity kind).
pub const RECORDS_DIR_NAME: &str = "records";

/// Directory name for doctor schedule rows.
pub const SCHEDULES_DIR_NAME: &str = "schedules";

/// Filename for an entity record inside its sharded directory.
pub const RECORD_FILENAME: &str = "record.yaml";

/// Slot type written on every encoded schedule row.
pub const IN_OFFICE_SLOT_TYPE: &str = "In-Office";
