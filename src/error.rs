use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusLoadError {
    #[error("failed to read corpus {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corpus root must be an object keyed by request id")]
    NotAnObject,

    #[error("corpus contains no requests")]
    Empty,

    #[error("request '{request_id}' must be an object keyed by section name")]
    InvalidRequest { request_id: String },

    #[error("request '{request_id}' has no sections")]
    NoSections { request_id: String },

    #[error("entry '{request_id}' / '{section}' must be an object")]
    InvalidEntry { request_id: String, section: String },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read evaluation snapshot {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: SnapshotDecodeError,
    },

    #[error("failed to write evaluation snapshot {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

#[derive(Error, Debug)]
pub enum SnapshotDecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed csv")]
    Csv(#[from] csv::Error),

    #[error("unexpected header {found:?}, expected request_id,section,rating,comment")]
    UnexpectedHeader { found: Vec<String> },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("user identity must not be empty")]
    EmptyIdentity,

    #[error("no user is logged in")]
    NoActiveUser,

    #[error("section '{section}' does not exist in request '{request_id}'")]
    InvalidSection { request_id: String, section: String },

    #[error("request '{0}' does not exist in the corpus")]
    UnknownRequest(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
