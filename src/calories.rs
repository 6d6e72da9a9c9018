//! Calories-burned estimate for a logged workout.
//!
//! This is a flat linear heuristic, not a metabolic model. Stored values and
//! client dashboards depend on the exact formula, so keep it as is.

use crate::parser::ParsedWorkout;

pub const CALORIE_FACTOR: f64 = 1.5;

/// `(sets + reps + weight + time) * 1.5`
pub fn estimate(sets: i64, reps: i64, weight: f64, time: f64) -> f64 {
    (sets as f64 + reps as f64 + weight + time) * CALORIE_FACTOR
}

pub fn estimate_workout(workout: &ParsedWorkout) -> f64 {
    estimate(workout.sets, workout.reps, workout.weight, workout.time)
}
