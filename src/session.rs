use std::path::PathBuf;

use tracing::{info, warn};

use crate::corpus::{Corpus, CorpusEntry, CorpusRequest};
use crate::error::{PersistenceError, SessionError};
use crate::model::{EvaluationRecord, Rating, SessionCursor};
use crate::store::{EvaluationStore, UpsertOutcome, quarantine_snapshot};


#[derive(Debug)]
pub struct UserBinding {
    pub changed: bool,
    pub resumed: bool,
    pub warning: Option<PersistenceError>,
}

pub struct SessionController<'c> {
    corpus: &'c Corpus,
    data_dir: PathBuf,
    store: Option<EvaluationStore>,
    cursor: SessionCursor,
}

impl<'c> SessionController<'c> {
    pub fn new(corpus: &'c Corpus, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus,
            data_dir: data_dir.into(),
            store: None,
            cursor: SessionCursor::default(),
        }
    }

    pub fn corpus(&self) -> &'c Corpus {
        self.corpus
    }

    pub fn cursor(&self) -> &SessionCursor {
        &self.cursor
    }

    pub fn store(&self) -> Option<&EvaluationStore> {
        self.store.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.store.as_ref().map(EvaluationStore::user_id)
    }

    /// Binds the session to `user_id`, loading that user's snapshot and
    /// moving the cursor to where they left off.
    ///
    /// An unreadable snapshot does not fail the login: it is moved aside and
    /// the session continues with an empty store, returning the read error as
    /// a warning.
    pub fn select_user(&mut self, user_id: &str) -> Result<UserBinding, SessionError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(SessionError::EmptyIdentity);
        }
        if self.user_id() == Some(user_id) {
            return Ok(UserBinding {
                changed: false,
                resumed: false,
                warning: None,
            });
        }

        let (store, warning) = match EvaluationStore::open(&self.data_dir, user_id) {
            Ok(store) => (store, None),
            Err(err @ PersistenceError::Read { .. }) => {
                match quarantine_snapshot(err.path()) {
                    Ok(moved) => warn!(
                        user = %user_id,
                        moved_to = %moved.display(),
                        error = %err,
                        "unreadable snapshot moved aside, starting empty"
                    ),
                    Err(rename_err) => warn!(
                        user = %user_id,
                        error = %err,
                        rename_error = %rename_err,
                        "unreadable snapshot could not be moved aside"
                    ),
                }
                (EvaluationStore::empty(&self.data_dir, user_id), Some(err))
            }
            Err(err) => return Err(err.into()),
        };

        let resumed = self.bind_store(store);
        info!(
            user = %user_id,
            request_index = self.cursor.request_index,
            section = ?self.cursor.selected_section,
            resumed,
            "user selected"
        );

        Ok(UserBinding {
            changed: true,
            resumed,
            warning,
        })
    }

    /// Binds an already opened store and restores the cursor from it.
    pub fn bind_store(&mut self, store: EvaluationStore) -> bool {
        self.store = Some(store);
        self.restore_cursor()
    }

    /// Moves the cursor to the request of the store's last record. Returns
    /// whether there was a record to resume from.
    pub fn restore_cursor(&mut self) -> bool {
        let Some(last) = self.store.as_ref().and_then(EvaluationStore::last_record) else {
            self.cursor = SessionCursor::default();
            return false;
        };

        self.cursor = match self.corpus.position_of(&last.request_id) {
            Some(request_index) => {
                let section_exists = self
                    .corpus
                    .request(request_index)
                    .is_some_and(|request| request.has_section(&last.section_name));
                SessionCursor {
                    request_index,
                    selected_section: section_exists.then(|| last.section_name.clone()),
                }
            }
            None => {
                warn!(
                    request_id = %last.request_id,
                    "last evaluated request is no longer in the corpus, starting from the first request"
                );
                SessionCursor::default()
            }
        };
        true
    }

    pub fn next(&mut self) {
        let last_index = self.corpus.request_count().saturating_sub(1);
        self.cursor.request_index = (self.cursor.request_index + 1).min(last_index);
        self.cursor.selected_section = None;
    }

    pub fn previous(&mut self) {
        self.cursor.request_index = self.cursor.request_index.saturating_sub(1);
        self.cursor.selected_section = None;
    }

    pub fn jump_to(&mut self, request_id: &str) -> Result<(), SessionError> {
        let request_index = self
            .corpus
            .position_of(request_id)
            .ok_or_else(|| SessionError::UnknownRequest(request_id.to_string()))?;
        self.cursor = SessionCursor {
            request_index,
            selected_section: None,
        };
        Ok(())
    }

    pub fn select_section(&mut self, name: &str) -> Result<(), SessionError> {
        let request = self.current_request();
        if !request.has_section(name) {
            return Err(SessionError::InvalidSection {
                request_id: request.request_id.clone(),
                section: name.to_string(),
            });
        }
        self.cursor.selected_section = Some(name.to_string());
        Ok(())
    }

    pub fn current_request(&self) -> &'c CorpusRequest {
        let requests = self.corpus.requests();
        &requests[self.cursor.request_index.min(requests.len() - 1)]
    }

    /// The selected section, or the request's first section when nothing is
    /// selected yet.
    pub fn current_entry(&self) -> &'c CorpusEntry {
        let request = self.current_request();
        self.cursor
            .selected_section
            .as_deref()
            .and_then(|name| request.section(name))
            .unwrap_or_else(|| request.first_section())
    }

    pub fn current_section(&self) -> &'c str {
        &self.current_entry().section_name
    }

    pub fn existing_record(&self) -> Option<&EvaluationRecord> {
        let store = self.store.as_ref()?;
        store.find(&self.current_request().request_id, self.current_section())
    }

    pub fn save(&mut self, rating: Rating, comment: &str) -> Result<UpsertOutcome, SessionError> {
        let request_id = &self.current_request().request_id;
        let section_name = self.current_section();
        let store = self.store.as_mut().ok_or(SessionError::NoActiveUser)?;

        let outcome = store.upsert(EvaluationRecord::new(
            request_id.as_str(),
            section_name,
            rating,
            comment,
        ))?;
        info!(
            user = %store.user_id(),
            request_id = %request_id,
            section = %section_name,
            rating = %rating,
            "evaluation saved"
        );
        Ok(outcome)
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        let store = self.store.as_mut().ok_or(SessionError::NoActiveUser)?;
        store.reset()?;
        Ok(())
    }
}
