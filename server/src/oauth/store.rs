use std::io::Write as _;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::RelayError;
use crate::oauth::token::{now_ms, TokenRecord};

/// Durable storage for the single Lawmatics token record.
///
/// The record lives in one JSON file. Reads that fail for any reason are
/// downgraded to "no record": the relay simply reports itself unauthorized
/// and the operator re-runs the authorization flow. Writes replace the file
/// atomically so a crash mid-save never leaves a half-written record behind.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stored record, if any. Unreadable or unparseable content is
    /// logged and treated as absent rather than surfaced as an error.
    pub fn load(&self) -> Option<TokenRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token file at {}", self.path.display());
                return None;
            }
            Err(err) => {
                warn!("Failed to read token file {}: {}", self.path.display(), err);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    "Token file {} is not valid JSON, treating as absent: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    /// Stamp the expiry and durably replace the stored record. The write goes
    /// to a temp file in the same directory and is renamed over the target so
    /// readers never observe a partial record.
    pub fn save(&self, record: TokenRecord) -> Result<TokenRecord, RelayError> {
        let record = record.with_expiry_stamp(now_ms());

        let json = serde_json::to_vec_pretty(&record)
            .map_err(|err| RelayError::Store(format!("failed to serialize token record: {err}")))?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new_in("."),
        }
        .map_err(|err| RelayError::Store(format!("failed to create temp token file: {err}")))?;

        tmp.write_all(&json)
            .map_err(|err| RelayError::Store(format!("failed to write token record: {err}")))?;
        tmp.persist(&self.path).map_err(|err| {
            RelayError::Store(format!(
                "failed to replace token file {}: {}",
                self.path.display(),
                err
            ))
        })?;

        Ok(record)
    }
}
