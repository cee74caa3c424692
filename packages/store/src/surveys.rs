//! Stored community survey submissions.

use std::collections::BTreeSet;

use accessmap_analysis_models::survey::SurveySubmission;
use tokio::sync::Mutex;

use crate::json_file::{read_json, write_json_atomic};
use crate::{DataDir, StoreError};

/// Reads and writes `surveys/survey_submissions_{state}.json`.
///
/// Ids are reserved per state before enrichment starts so that concurrent
/// submissions never collide; a reservation is released when the submission
/// is stored or abandoned.
#[derive(Debug)]
pub struct SurveyStore {
    dir: DataDir,
    /// Reserved `(state, id)` pairs.
    inner: Mutex<BTreeSet<(String, String)>>,
}

impl SurveyStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: DataDir) -> Self {
        Self {
            dir,
            inner: Mutex::new(BTreeSet::new()),
        }
    }

    /// All stored submissions for `state`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read.
    pub fn load(&self, state: &str) -> Result<Vec<SurveySubmission>, StoreError> {
        Ok(read_json(&self.dir.survey_submissions(state))?.unwrap_or_default())
    }

    /// Reserves the next free `survey_{n}` id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the stored submissions cannot be read.
    pub async fn reserve_id(&self, state: &str) -> Result<String, StoreError> {
        let mut reserved = self.inner.lock().await;
        let taken: BTreeSet<String> = self.load(state)?.into_iter().map(|s| s.id).collect();

        let mut n = taken.len() + 1;
        loop {
            let key = (state.to_string(), format!("survey_{n}"));
            if !taken.contains(&key.1) && !reserved.contains(&key) {
                let id = key.1.clone();
                reserved.insert(key);
                return Ok(id);
            }
            n += 1;
        }
    }

    /// Drops a reservation in `state` without storing anything.
    pub async fn release_id(&self, state: &str, id: &str) {
        self.inner
            .lock()
            .await
            .remove(&(state.to_string(), id.to_string()));
    }

    /// Stores `submission`, replacing any stored submission with the same
    /// id, and releases its reservation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if reading or writing fails.
    pub async fn upsert(&self, state: &str, submission: SurveySubmission) -> Result<(), StoreError> {
        let mut reserved = self.inner.lock().await;
        let path = self.dir.survey_submissions(state);
        let mut submissions = self.load(state)?;

        let id = submission.id.clone();
        if let Some(existing) = submissions.iter_mut().find(|s| s.id == id) {
            log::info!("Replacing survey submission {id}");
            *existing = submission;
        } else {
            submissions.push(submission);
        }

        write_json_atomic(&path, &submissions)?;
        reserved.remove(&(state.to_string(), id.clone()));
        log::info!(
            "Stored survey submission {id} ({} total for {state})",
            submissions.len()
        );
        Ok(())
    }
}
