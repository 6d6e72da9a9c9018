//! Per-day calorie statistics over stored workouts. Days are UTC calendar days.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::db::{self, Pool};
use crate::model::Workout;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_calories_burnt: f64,
    pub total_workouts: i64,
    pub avg_calories_burnt_per_workout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkouts {
    pub todays_workouts: Vec<Workout>,
    pub total_calories_burnt: f64,
}

/// `[start of day, start of next day)` in UTC, or `None` when the next day
/// is past the calendar range chrono supports.
pub fn day_bounds(day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::default()));
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

fn window(day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    day_bounds(day).with_context(|| format!("day {} is out of range", day))
}

pub async fn dashboard(pool: &Pool, user_id: i64, day: NaiveDate) -> Result<DashboardSummary> {
    let (start, end) = window(day)?;
    let (total, count) = db::calorie_totals_between(pool, user_id, start, end).await?;
    let average = if count > 0 { total / count as f64 } else { 0.0 };
    Ok(DashboardSummary {
        total_calories_burnt: total,
        total_workouts: count,
        avg_calories_burnt_per_workout: average,
    })
}

pub async fn workouts_on(pool: &Pool, user_id: i64, day: NaiveDate) -> Result<DailyWorkouts> {
    let (start, end) = window(day)?;
    let workouts = db::workouts_between(pool, user_id, start, end).await?;
    let total: f64 = workouts.iter().map(|w| w.calories_burned).sum();
    Ok(DailyWorkouts {
        todays_workouts: workouts,
        total_calories_burnt: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewWorkout;

    async fn setup_pool() -> (Pool, i64) {
        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let uid = db::create_user(&pool, "Alice", "alice@example.com", "hash", None)
            .await
            .unwrap()
            .id;
        (pool, uid)
    }

    fn record(user: i64, calories_burned: f64) -> NewWorkout {
        NewWorkout {
            user,
            category: "Legs".into(),
            workout_name: "Squat".into(),
            sets: 3,
            reps: 10,
            weight: 80.0,
            time: 45.0,
            calories_burned,
        }
    }

    #[test]
    fn bounds_cover_one_utc_day() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (start, end) = day_bounds(day).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-10-16T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-10-17T00:00:00+00:00");
    }

    #[test]
    fn last_representable_day_has_no_bounds() {
        assert!(day_bounds(NaiveDate::MAX).is_none());
        assert!(day_bounds(NaiveDate::MAX.pred_opt().unwrap()).is_some());
    }

    #[tokio::test]
    async fn out_of_range_day_is_an_error() {
        let (pool, uid) = setup_pool().await;
        assert!(workouts_on(&pool, uid, NaiveDate::MAX).await.is_err());
        assert!(dashboard(&pool, uid, NaiveDate::MAX).await.is_err());
    }

    #[tokio::test]
    async fn empty_day_has_zero_average() {
        let (pool, uid) = setup_pool().await;
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let summary = dashboard(&pool, uid, day).await.unwrap();
        assert_eq!(
            summary,
            DashboardSummary {
                total_calories_burnt: 0.0,
                total_workouts: 0,
                avg_calories_burnt_per_workout: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn totals_and_average_for_day() {
        let (pool, uid) = setup_pool().await;
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (start, _) = day_bounds(day).unwrap();
        db::insert_workouts(
            &pool,
            &[record(uid, 207.0), record(uid, 93.0)],
            start + Duration::hours(8),
        )
        .await
        .unwrap();
        db::insert_workouts(&pool, &[record(uid, 500.0)], start + Duration::days(1))
            .await
            .unwrap();

        let summary = dashboard(&pool, uid, day).await.unwrap();
        assert_eq!(summary.total_calories_burnt, 300.0);
        assert_eq!(summary.total_workouts, 2);
        assert_eq!(summary.avg_calories_burnt_per_workout, 150.0);

        let daily = workouts_on(&pool, uid, day).await.unwrap();
        assert_eq!(daily.todays_workouts.len(), 2);
        assert_eq!(daily.total_calories_burnt, 300.0);

        let next = workouts_on(&pool, uid, day.succ_opt().unwrap()).await.unwrap();
        assert_eq!(next.total_calories_burnt, 500.0);
    }
}
