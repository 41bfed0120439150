use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{PersistenceError, SnapshotDecodeError};
use crate::model::{EvaluationRecord, RatingCounts};

mod snapshot;
#[cfg(test)]
mod tests;

pub use snapshot::{decode_snapshot, quarantine_snapshot, snapshot_file_name, snapshot_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted { position: usize },
    Replaced { position: usize },
}

/// One user's ratings, kept in insertion order and written through to a CSV
/// snapshot after every mutation.
#[derive(Debug)]
pub struct EvaluationStore {
    user_id: String,
    path: PathBuf,
    records: Vec<EvaluationRecord>,
}

impl EvaluationStore {
    pub fn open(data_dir: &Path, user_id: &str) -> Result<Self, PersistenceError> {
        let path = snapshot_path(data_dir, user_id);
        let read_error = |source: SnapshotDecodeError| PersistenceError::Read {
            path: path.clone(),
            source,
        };

        let rows = match fs::read(&path) {
            Ok(bytes) => decode_snapshot(&bytes).map_err(read_error)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot yet, starting empty");
                Vec::new()
            }
            Err(err) => return Err(read_error(SnapshotDecodeError::Io(err))),
        };

        let row_count = rows.len();
        let records = fold_duplicate_keys(rows);
        if records.len() < row_count {
            warn!(
                path = %path.display(),
                collapsed = row_count - records.len(),
                "snapshot contained duplicate keys, keeping the latest rating for each"
            );
        }

        info!(
            user = %user_id,
            path = %path.display(),
            records = records.len(),
            "loaded evaluation snapshot"
        );

        Ok(Self {
            user_id: user_id.to_string(),
            path,
            records,
        })
    }

    pub fn empty(data_dir: &Path, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            path: snapshot_path(data_dir, user_id),
            records: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn last_record(&self) -> Option<&EvaluationRecord> {
        self.records.last()
    }

    pub fn find(&self, request_id: &str, section_name: &str) -> Option<&EvaluationRecord> {
        self.records
            .iter()
            .find(|record| record.has_key(request_id, section_name))
    }

    pub fn upsert(&mut self, record: EvaluationRecord) -> Result<UpsertOutcome, PersistenceError> {
        let existing = self
            .records
            .iter()
            .position(|current| current.key() == record.key());

        let outcome = match existing {
            Some(position) => {
                let previous = std::mem::replace(&mut self.records[position], record);
                if let Err(err) = self.persist() {
                    self.records[position] = previous;
                    return Err(err);
                }
                UpsertOutcome::Replaced { position }
            }
            None => {
                self.records.push(record);
                if let Err(err) = self.persist() {
                    self.records.pop();
                    return Err(err);
                }
                UpsertOutcome::Inserted {
                    position: self.records.len() - 1,
                }
            }
        };

        debug!(user = %self.user_id, outcome = ?outcome, "evaluation saved");
        Ok(outcome)
    }

    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        let previous = std::mem::take(&mut self.records);
        if let Err(err) = self.persist() {
            self.records = previous;
            return Err(err);
        }

        info!(user = %self.user_id, path = %self.path.display(), "evaluations reset");
        Ok(())
    }

    pub fn export_snapshot(&self) -> io::Result<Vec<u8>> {
        snapshot::encode_snapshot(&self.records)
    }

    pub fn rating_counts(&self) -> RatingCounts {
        let mut counts = RatingCounts::default();
        for record in &self.records {
            counts.record(record.rating);
        }
        counts
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let write_error = |source: io::Error| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        let bytes = self.export_snapshot().map_err(write_error)?;
        snapshot::write_snapshot(&self.path, &bytes).map_err(write_error)
    }
}

fn fold_duplicate_keys(rows: Vec<EvaluationRecord>) -> Vec<EvaluationRecord> {
    let mut records: Vec<EvaluationRecord> = Vec::with_capacity(rows.len());
    for row in rows {
        match records.iter_mut().find(|current| current.key() == row.key()) {
            Some(current) => *current = row,
            None => records.push(row),
        }
    }
    records
}
