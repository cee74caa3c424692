//! The per-region aggregate [`AnalysisResult`] document.

use accessmap_analysis_models::result::AnalysisResult;
use tokio::sync::Mutex;

use crate::json_file::{read_json, write_json_atomic};
use crate::{DataDir, StoreError};

/// Reads and writes `results/multi_agent_analysis_{state}.json`.
///
/// All writes go through [`ResultStore::update`], which holds one mutex for
/// the whole read-modify-write so concurrent writers cannot lose each
/// other's updates.
#[derive(Debug)]
pub struct ResultStore {
    dir: DataDir,
    write_lock: Mutex<()>,
}

impl ResultStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: DataDir) -> Self {
        Self {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    /// The data directory.
    #[must_use]
    pub const fn data_dir(&self) -> &DataDir {
        &self.dir
    }

    /// Loads the last fully written result for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read.
    pub fn load(&self, state: &str) -> Result<Option<AnalysisResult>, StoreError> {
        read_json(&self.dir.analysis_result(state))
    }

    /// Replaces the result for `state` with `result`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub async fn save(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.dir.analysis_result(&result.metadata.state);
        write_json_atomic(&path, result)?;
        log::info!("Saved analysis result to {}", path.display());
        Ok(())
    }

    /// Read-modify-write under the store lock.
    ///
    /// `f` receives the current document (or `None`) and returns whether
    /// it changed it. The document is written only when `f` returns
    /// `Ok(true)` and leaves a value in the slot.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a [`StoreError`] from reading or
    /// writing.
    pub async fn update<F, E>(&self, state: &str, f: F) -> Result<bool, E>
    where
        F: FnOnce(&mut Option<AnalysisResult>) -> Result<bool, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.dir.analysis_result(state);

        let mut slot = read_json::<AnalysisResult>(&path)?;
        if !f(&mut slot)? {
            return Ok(false);
        }

        let Some(result) = slot else {
            return Ok(false);
        };
        write_json_atomic(&path, &result)?;
        log::info!("Updated analysis result at {}", path.display());
        Ok(true)
    }
}
