//! Record identifiers and the sharded directory layout derived from them.
//!
//! Records created by the clinic stores get a random UUID in *canonical* form: 32 lowercase
//! hexadecimal characters, no hyphens (`Uuid::new_v4().simple()`). Identifiers supplied from
//! outside (API paths, CLI arguments) must already be canonical before the file store will turn
//! them into paths.
//!
//! For a canonical id `u`, the file store keeps the record under
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, which keeps any single directory from growing
//! without bound.

use crate::error::StoreError;
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// A canonical record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an identifier that must already be canonical.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so a record can only
    /// ever be reached through one spelling of its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] if `input` is not canonical.
    pub fn parse(input: &str) -> Result<Self, StoreError> {
        if !Self::is_canonical(input) {
            return Err(StoreError::InvalidId(format!(
                "record id must be 32 lowercase hex characters without hyphens, got: '{input}'"
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| StoreError::InvalidId(e.to_string()))
    }

    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/`.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.to_string();
        parent_dir
            .join(&canonical[0..2])
            .join(&canonical[2..4])
            .join(&canonical)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}
