use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RateArgs;
use crate::commands::load_corpus;
use crate::session::SessionController;
use crate::store::UpsertOutcome;

pub fn run(args: RateArgs) -> Result<()> {
    let (corpus, _) = load_corpus(&args.source.corpus)?;
    let mut session = SessionController::new(&corpus, &args.source.data_dir);

    let binding = session.select_user(&args.user)?;
    if let Some(warning) = &binding.warning {
        warn!(error = %warning, "previous evaluations could not be read");
    }

    session.jump_to(&args.request)?;
    if let Some(section) = &args.section {
        session.select_section(section)?;
    }

    let outcome = session
        .save(args.rating, &args.comment)
        .context("evaluation was not saved")?;

    let action = match outcome {
        UpsertOutcome::Inserted { .. } => "inserted",
        UpsertOutcome::Replaced { .. } => "replaced",
    };
    info!(
        request_id = %args.request,
        section = %session.current_section(),
        rating = %args.rating,
        action,
        "rate completed"
    );

    Ok(())
}
