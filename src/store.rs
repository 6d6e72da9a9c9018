use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;

use crate::db::{self, Pool};
use crate::model::{NewWorkout, Workout};

/// Persistence seam for workout batches.
///
/// `insert_many` is all-or-nothing: on error no record of the batch is
/// considered stored. Implementations assign ids and the workout date.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn insert_many(&self, records: &[NewWorkout]) -> Result<Vec<Workout>>;
}

#[derive(Clone)]
pub struct SqliteWorkoutStore {
    pool: Pool,
}

impl fmt::Debug for SqliteWorkoutStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteWorkoutStore").finish_non_exhaustive()
    }
}

impl SqliteWorkoutStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
    async fn insert_many(&self, records: &[NewWorkout]) -> Result<Vec<Workout>> {
        db::insert_workouts(&self.pool, records, Utc::now()).await
    }
}
