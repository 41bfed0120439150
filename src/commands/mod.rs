use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::corpus::Corpus;
use crate::util::sha256_file;

pub mod export;
pub mod rate;
pub mod render;
pub mod reset;
pub mod review;
pub mod show;
pub mod status;

/// Loads the corpus and returns it with the SHA-256 of the source file.
pub fn load_corpus(path: &Path) -> Result<(Corpus, String)> {
    let corpus = Corpus::load(path).context("corpus could not be loaded")?;
    let fingerprint = sha256_file(path)?;

    info!(
        path = %path.display(),
        requests = corpus.request_count(),
        entries = corpus.entry_count(),
        sha256 = %fingerprint,
        "loaded corpus"
    );

    Ok((corpus, fingerprint))
}
