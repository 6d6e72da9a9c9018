use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calories;
use crate::parser::ParsedWorkout;

/// Account as exposed to clients. The password hash never leaves the db layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A parsed workout annotated with its owner and calorie estimate, not yet
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub user: i64,
    pub category: String,
    pub workout_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub time: f64,
    pub calories_burned: f64,
}

impl NewWorkout {
    pub fn from_parsed(user: i64, workout: ParsedWorkout) -> Self {
        let calories_burned = calories::estimate_workout(&workout);
        Self {
            user,
            category: workout.category,
            workout_name: workout.workout_name,
            sets: workout.sets,
            reps: workout.reps,
            weight: workout.weight,
            time: workout.time,
            calories_burned,
        }
    }
}

/// A persisted workout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: i64,
    pub user: i64,
    pub category: String,
    pub workout_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub time: f64,
    pub calories_burned: f64,
    pub date: DateTime<Utc>,
}

impl Workout {
    pub fn from_new(id: i64, record: NewWorkout, date: DateTime<Utc>) -> Self {
        Self {
            id,
            user: record.user,
            category: record.category,
            workout_name: record.workout_name,
            sets: record.sets,
            reps: record.reps,
            weight: record.weight,
            time: record.time,
            calories_burned: record.calories_burned,
            date,
        }
    }
}
