use super::model::UserCredentials;
use crate::model::{NewWorkout, User, Workout};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every in-memory connection is its own database, so keep exactly one
    // connection alive for the lifetime of the pool.
    let pool = if is_memory_url(&normalized) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePool::connect_with(options).await?
    };

    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

fn is_memory_url(url: &str) -> bool {
    url.starts_with("sqlite::memory") || url.contains("mode=memory")
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match path_part.strip_prefix("~/") {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
            Err(_) => path_part.to_string(),
        },
        None => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_user(
    pool: &Pool,
    name: &str,
    email: &str,
    password_hash: &str,
    img: Option<&str>,
) -> Result<User> {
    let created_at = Utc::now();
    let rec = sqlx::query(
        "INSERT INTO users (name, email, password_hash, img, created_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(img)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .context("failed to insert user")?;

    Ok(User {
        id: rec.get("id"),
        name: name.to_string(),
        email: email.to_string(),
        img: img.map(str::to_string),
        created_at,
    })
}

#[instrument(skip_all)]
pub async fn find_user_by_email(pool: &Pool, email: &str) -> Result<Option<UserCredentials>> {
    let row = sqlx::query(
        "SELECT id, name, email, img, created_at, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    Ok(Some(UserCredentials {
        user: user_from_row(&row)?,
        password_hash: row.try_get("password_hash")?,
    }))
}

#[instrument(skip_all)]
pub async fn find_user_by_id(pool: &Pool, user_id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, name, email, img, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(|row| user_from_row(&row))
        .transpose()
        .map_err(anyhow::Error::from)
}

/// Insert a batch of workouts in one transaction. Either every record is
/// stored or none is.
#[instrument(skip_all, fields(count = records.len()))]
pub async fn insert_workouts(
    pool: &Pool,
    records: &[NewWorkout],
    date: DateTime<Utc>,
) -> Result<Vec<Workout>> {
    let mut tx = pool.begin().await?;
    let mut stored = Vec::with_capacity(records.len());
    for record in records {
        let id: i64 = sqlx::query(
            "INSERT INTO workouts (user_id, category, workout_name, sets, reps, weight, time, calories_burned, date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(record.user)
        .bind(&record.category)
        .bind(&record.workout_name)
        .bind(record.sets)
        .bind(record.reps)
        .bind(record.weight)
        .bind(record.time)
        .bind(record.calories_burned)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert workout {}", record.workout_name))?
        .get("id");
        stored.push(Workout::from_new(id, record.clone(), date));
    }
    tx.commit().await?;
    Ok(stored)
}

/// Workouts of `user_id` dated within `[start, end)`, oldest first.
#[instrument(skip_all)]
pub async fn workouts_between(
    pool: &Pool,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Workout>> {
    let rows = sqlx::query(
        "SELECT id, user_id, category, workout_name, sets, reps, weight, time, calories_burned, date \
         FROM workouts WHERE user_id = ? AND date >= ? AND date < ? ORDER BY date ASC, id ASC",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| workout_from_row(row).map_err(anyhow::Error::from))
        .collect()
}

/// Total calories and workout count for `user_id` within `[start, end)`.
#[instrument(skip_all)]
pub async fn calorie_totals_between(
    pool: &Pool,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(f64, i64)> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(calories_burned), 0.0) AS total, COUNT(*) AS workouts \
         FROM workouts WHERE user_id = ? AND date >= ? AND date < ?",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok((row.try_get("total")?, row.try_get("workouts")?))
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        img: row.try_get::<Option<String>, _>("img")?,
        created_at: row.try_get("created_at")?,
    })
}

fn workout_from_row(row: &SqliteRow) -> Result<Workout, sqlx::Error> {
    Ok(Workout {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        category: row.try_get("category")?,
        workout_name: row.try_get("workout_name")?,
        sets: row.try_get("sets")?,
        reps: row.try_get("reps")?,
        weight: row.try_get("weight")?,
        time: row.try_get("time")?,
        calories_burned: row.try_get("calories_burned")?,
        date: row.try_get("date")?,
    })
}
