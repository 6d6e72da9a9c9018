use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use fitlog::calories;
use fitlog::parser::{self, ParsedWorkout, RejectedEntry};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Parse a workout submission and print what would be stored"
)]
struct Args {
    /// File holding the workout text; reads stdin when omitted
    file: Option<PathBuf>,

    /// Print compact JSON on a single line
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimatedWorkout {
    #[serde(flatten)]
    workout: ParsedWorkout,
    calories_burned: f64,
}

#[derive(Debug, Serialize)]
struct Report {
    accepted: Vec<EstimatedWorkout>,
    rejected: Vec<RejectedEntry>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let raw = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let submission = parser::parse_submission(&raw);
    tracing::debug!(
        accepted = submission.accepted.len(),
        rejected = submission.rejected.len(),
        "parsed submission"
    );

    let report = Report {
        accepted: submission
            .accepted
            .into_iter()
            .map(|workout| EstimatedWorkout {
                calories_burned: calories::estimate_workout(&workout),
                workout,
            })
            .collect(),
        rejected: submission.rejected,
    };

    let out = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", out);
    Ok(())
}
