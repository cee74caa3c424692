//! Outputs of individually run pipeline stages.
//!
//! Each file holds one record list under a stage-specific key plus a small
//! metadata block:
//!
//! ```json
//! { "scan_results": [...], "metadata": { "agent": "AccessScanner", "state": "CA", ... } }
//! ```

use accessmap_analysis_models::AgentName;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::json_file::{read_json, write_json_atomic};
use crate::{DataDir, StoreError};

/// A pipeline stage whose output can be stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Accessibility gaps.
    #[strum(serialize = "scan_results")]
    Scan,
    /// Ranked priority areas.
    #[strum(serialize = "priority_areas")]
    Priority,
    /// Recommendations.
    #[strum(serialize = "recommendations")]
    Plan,
}

impl Stage {
    /// The agent that produces this stage's records.
    #[must_use]
    pub const fn agent(self) -> AgentName {
        match self {
            Self::Scan => AgentName::AccessScanner,
            Self::Priority => AgentName::EquityAdvisor,
            Self::Plan => AgentName::PlannerBot,
        }
    }
}

/// Metadata block of a stage file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMetadata {
    pub agent: AgentName,
    pub state: String,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
}

/// Reads and writes `results/{stage}_{state}.json`.
#[derive(Debug, Clone)]
pub struct StageStore {
    dir: DataDir,
}

impl StageStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub const fn new(dir: DataDir) -> Self {
        Self { dir }
    }

    /// Writes `records` as the output of `stage` for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the write fails.
    pub fn save<T: Serialize>(&self, stage: Stage, state: &str, records: &[T]) -> Result<(), StoreError> {
        let metadata = StageMetadata {
            agent: stage.agent(),
            state: state.to_string(),
            generated_at: Utc::now(),
            record_count: records.len(),
        };

        let mut doc = serde_json::Map::new();
        doc.insert(stage.as_ref().to_string(), serde_json::to_value(records)?);
        doc.insert("metadata".to_string(), serde_json::to_value(metadata)?);

        let path = self.dir.stage_output(stage.as_ref(), state);
        write_json_atomic(&path, &doc)?;
        log::info!(
            "Saved {} {stage} records to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }

    /// Reads the stored output of `stage` for `state`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but is malformed.
    pub fn load<T: DeserializeOwned>(&self, stage: Stage, state: &str) -> Result<Option<Vec<T>>, StoreError> {
        let path = self.dir.stage_output(stage.as_ref(), state);
        let Some(mut doc) = read_json::<serde_json::Map<String, serde_json::Value>>(&path)? else {
            return Ok(None);
        };

        let records = doc.remove(stage.as_ref()).unwrap_or_default();
        serde_json::from_value(records)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }
}
