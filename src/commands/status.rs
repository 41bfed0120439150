use std::fs;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::load_corpus;
use crate::model::RatingCounts;
use crate::session::SessionController;
use crate::store::EvaluationStore;
use crate::util::{system_time_utc_string, write_json_pretty};

#[derive(Debug, Serialize)]
struct StatusReport {
    corpus_path: String,
    corpus_sha256: String,
    requests: usize,
    entries: usize,
    user: Option<UserStatus>,
}

#[derive(Debug, Serialize)]
struct UserStatus {
    user_id: String,
    snapshot_path: String,
    snapshot_modified_at: Option<String>,
    records: usize,
    evaluated_entries: usize,
    coverage: f64,
    ratings: RatingCounts,
    resume_request_id: String,
    resume_section: Option<String>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let (corpus, corpus_sha256) = load_corpus(&args.source.corpus)?;

    let user = match args.user.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => {
            let store = EvaluationStore::open(&args.source.data_dir, user_id)
                .context("evaluations could not be loaded for status")?;
            let snapshot_modified_at = fs::metadata(store.path())
                .and_then(|metadata| metadata.modified())
                .ok()
                .map(system_time_utc_string);

            let records = store.records().len();
            let evaluated_entries = store
                .records()
                .iter()
                .filter(|record| {
                    corpus
                        .find(&record.request_id)
                        .is_some_and(|request| request.has_section(&record.section_name))
                })
                .count();
            let snapshot_path = store.path().display().to_string();
            let ratings = store.rating_counts();

            let mut session = SessionController::new(&corpus, &args.source.data_dir);
            session.bind_store(store);
            Some(UserStatus {
                user_id: user_id.to_string(),
                snapshot_path,
                snapshot_modified_at,
                records,
                evaluated_entries,
                coverage: evaluated_entries as f64 / corpus.entry_count() as f64,
                ratings,
                resume_request_id: session.current_request().request_id.clone(),
                resume_section: session.cursor().selected_section.clone(),
            })
        }
        Some(_) => {
            warn!("ignoring empty --user");
            None
        }
        None => None,
    };

    let report = StatusReport {
        corpus_path: args.source.corpus.display().to_string(),
        corpus_sha256,
        requests: corpus.request_count(),
        entries: corpus.entry_count(),
        user,
    };

    if args.json {
        let mut output = BufWriter::new(io::stdout().lock());
        return write_json_pretty(&mut output, &report);
    }

    info!(
        path = %report.corpus_path,
        sha256 = %report.corpus_sha256,
        requests = report.requests,
        entries = report.entries,
        "corpus status"
    );

    match &report.user {
        Some(user) => info!(
            user = %user.user_id,
            path = %user.snapshot_path,
            modified_at = %user.snapshot_modified_at.as_deref().unwrap_or(""),
            records = user.records,
            evaluated_entries = user.evaluated_entries,
            coverage = %format!("{:.1}%", user.coverage * 100.0),
            correct = user.ratings.correct,
            incorrect = user.ratings.incorrect,
            ambiguous = user.ratings.ambiguous,
            resume_request_id = %user.resume_request_id,
            resume_section = %user.resume_section.as_deref().unwrap_or(""),
            "evaluation status"
        ),
        None => info!("no user given, skipping evaluation status"),
    }

    Ok(())
}
