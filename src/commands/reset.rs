use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::cli::ResetArgs;
use crate::error::SessionError;
use crate::store::EvaluationStore;

#[cfg(test)]
mod tests;

pub fn run(args: ResetArgs) -> Result<()> {
    let user_id = args.user.trim();
    if user_id.is_empty() {
        return Err(SessionError::EmptyIdentity.into());
    }
    if !args.yes {
        bail!("refusing to delete evaluations for '{user_id}' without --yes");
    }

    let mut store = match EvaluationStore::open(&args.data_dir, user_id) {
        Ok(store) => store,
        Err(err) => {
            warn!(user = %user_id, error = %err, "overwriting unreadable snapshot");
            EvaluationStore::empty(&args.data_dir, user_id)
        }
    };
    store
        .reset()
        .with_context(|| format!("failed to reset evaluations for '{user_id}'"))?;

    Ok(())
}
