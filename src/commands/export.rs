use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExportArgs;
use crate::error::SessionError;
use crate::store::{EvaluationStore, snapshot_file_name};
use crate::util::{ensure_directory, now_utc_string};

pub fn run(args: ExportArgs) -> Result<()> {
    let user_id = args.user.trim();
    if user_id.is_empty() {
        return Err(SessionError::EmptyIdentity.into());
    }

    let store = EvaluationStore::open(&args.data_dir, user_id)
        .context("evaluations could not be loaded for export")?;

    let output = args
        .output
        .unwrap_or_else(|| default_export_path(store.user_id()));
    export_store(&store, &output)?;

    Ok(())
}

pub fn default_export_path(user_id: &str) -> PathBuf {
    PathBuf::from(snapshot_file_name(user_id))
}

pub fn export_store(store: &EvaluationStore, output: &Path) -> Result<()> {
    let bytes = store
        .export_snapshot()
        .context("failed to encode evaluation snapshot")?;

    if output == Path::new("-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    } else {
        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        fs::write(output, &bytes)
            .with_context(|| format!("failed to write export: {}", output.display()))?;
    }

    info!(
        user = %store.user_id(),
        records = store.records().len(),
        path = %output.display(),
        exported_at = %now_utc_string(),
        "exported evaluations"
    );

    Ok(())
}
