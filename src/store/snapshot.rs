use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};

use crate::error::SnapshotDecodeError;
use crate::model::EvaluationRecord;
use crate::util::{ensure_directory, sha256_hex, utc_compact_string};

pub const SNAPSHOT_HEADER: [&str; 4] = ["request_id", "section", "rating", "comment"];

const SNAPSHOT_PREFIX: &str = "evaluations_";
const SNAPSHOT_EXTENSION: &str = "csv";
const MAX_SAFE_ID_LEN: usize = 100;

/// Identities that are not already filesystem-safe, or are too long for a
/// file name, get an escaped and truncated stem plus a digest suffix.
pub fn snapshot_file_name(user_id: &str) -> String {
    let mut safe: String = user_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if safe == user_id && safe.len() <= MAX_SAFE_ID_LEN {
        return format!("{SNAPSHOT_PREFIX}{safe}.{SNAPSHOT_EXTENSION}");
    }

    // Every character of `safe` is ASCII, so any byte index is a boundary.
    safe.truncate(MAX_SAFE_ID_LEN);
    let digest = sha256_hex(user_id.as_bytes());
    format!(
        "{SNAPSHOT_PREFIX}{safe}-{}.{SNAPSHOT_EXTENSION}",
        &digest[..8]
    )
}

pub fn snapshot_path(data_dir: &Path, user_id: &str) -> PathBuf {
    data_dir.join(snapshot_file_name(user_id))
}

pub fn encode_snapshot(records: &[EvaluationRecord]) -> io::Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(SNAPSHOT_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|err| err.into_error())
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<EvaluationRecord>, SnapshotDecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers = reader.headers()?;
    let matches_header = headers.len() == SNAPSHOT_HEADER.len()
        && headers
            .iter()
            .zip(SNAPSHOT_HEADER)
            .all(|(found, expected)| found.trim() == expected);
    if !matches_header {
        return Err(SnapshotDecodeError::UnexpectedHeader {
            found: headers.iter().map(ToOwned::to_owned).collect(),
        });
    }

    let mut records = Vec::new();
    for row in reader.deserialize::<EvaluationRecord>() {
        records.push(row?);
    }

    Ok(records)
}

pub fn write_snapshot(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let temp_path = sibling_path(path, "tmp");
    if let Err(err) = fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    Ok(())
}

pub fn quarantine_snapshot(path: &Path) -> io::Result<PathBuf> {
    let target = sibling_path(
        path,
        &format!("corrupt-{}", utc_compact_string(Utc::now())),
    );
    fs::rename(path, &target)?;
    Ok(target)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
