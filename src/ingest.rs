//! Workout ingestion: parse a submission, annotate each accepted entry with
//! its owner and calorie estimate, and persist the batch in one write.
//!
//! Entries that cannot be parsed are dropped individually. The request only
//! fails when the submission is missing or nothing in it could be parsed.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::model::{NewWorkout, Workout};
use crate::parser::{self, Submission};
use crate::store::WorkoutStore;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Workout string is missing")]
    MissingWorkoutString,
    #[error("Invalid workout format")]
    NoValidEntries,
    #[error("failed to store workouts: {0:#}")]
    Storage(#[source] anyhow::Error),
}

impl IngestError {
    /// True for errors caused by the request content rather than the server.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            IngestError::MissingWorkoutString | IngestError::NoValidEntries
        )
    }
}

/// Parse `raw` and build the owner-annotated batch without touching storage.
pub fn prepare_batch(owner_id: i64, raw: Option<&str>) -> Result<Vec<NewWorkout>, IngestError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(IngestError::MissingWorkoutString),
    };

    let Submission { accepted, rejected } = parser::parse_submission(raw);
    for entry in &rejected {
        debug!(index = entry.index, reason = %entry.reason, "dropping workout entry");
    }
    if accepted.is_empty() {
        return Err(IngestError::NoValidEntries);
    }

    Ok(accepted
        .into_iter()
        .map(|workout| NewWorkout::from_parsed(owner_id, workout))
        .collect())
}

/// Ingest a workout submission for `owner_id` and return the stored records.
#[instrument(skip_all, fields(owner_id = owner_id))]
pub async fn add_workouts(
    store: &dyn WorkoutStore,
    owner_id: i64,
    raw: Option<&str>,
) -> Result<Vec<Workout>, IngestError> {
    let batch = prepare_batch(owner_id, raw)?;

    let stored = store.insert_many(&batch).await.map_err(|err| {
        warn!(?err, owner_id, count = batch.len(), "failed to store workout batch");
        IngestError::Storage(err)
    })?;

    info!(owner_id, count = stored.len(), "workouts added");
    Ok(stored)
}
