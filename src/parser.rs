//! Parser for the free-text workout shorthand.
//!
//! A submission holds one or more entries separated by `;`. Each entry is
//! five newline-separated fields:
//!
//! ```text
//! #Legs
//! *Squat
//! -3 sets 10 reps
//! 80 weight
//! 45 time
//! ```
//!
//! The first character of the category, name and volume lines is a marker
//! and is discarded whatever it is. Numbers are read with leading-numeral
//! semantics: `"80kg"` reads as 80, `"kg"` reads as nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

pub const ENTRY_SEPARATOR: char = ';';
pub const MIN_ENTRY_FIELDS: usize = 5;

const SETS: &str = "sets";
const REPS: &str = "reps";
const WEIGHT: &str = "weight";
const TIME: &str = "time";

static LEADING_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("valid integer pattern"));

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float pattern")
});

/// Numeric sub-fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Sets,
    Reps,
    Weight,
    Time,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::Sets => SETS,
            NumericField::Reps => REPS,
            NumericField::Weight => WEIGHT,
            NumericField::Time => TIME,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry as read from the text. Numeric fields are `None` when the
/// relevant sub-field does not start with a numeral.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub category: String,
    pub workout_name: String,
    pub sets: Option<i64>,
    pub reps: Option<i64>,
    pub weight: Option<f64>,
    pub time: Option<f64>,
}

/// A fully numeric workout ready for calorie estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedWorkout {
    pub category: String,
    pub workout_name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub time: f64,
}

impl ParsedEntry {
    /// First numeric field that failed to parse, in field order.
    pub fn missing_field(&self) -> Option<NumericField> {
        if self.sets.is_none() {
            Some(NumericField::Sets)
        } else if self.reps.is_none() {
            Some(NumericField::Reps)
        } else if self.weight.is_none() {
            Some(NumericField::Weight)
        } else if self.time.is_none() {
            Some(NumericField::Time)
        } else {
            None
        }
    }

    pub fn into_workout(self) -> Result<ParsedWorkout, NumericField> {
        match (self.sets, self.reps, self.weight, self.time) {
            (Some(sets), Some(reps), Some(weight), Some(time)) => Ok(ParsedWorkout {
                category: self.category,
                workout_name: self.workout_name,
                sets,
                reps,
                weight,
                time,
            }),
            _ => Err(self.missing_field().unwrap_or(NumericField::Sets)),
        }
    }
}

/// Why an entry of a submission was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    TooFewFields { found: usize },
    NotANumber { field: NumericField },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewFields { found } => write!(
                f,
                "expected at least {} lines, found {}",
                MIN_ENTRY_FIELDS, found
            ),
            RejectReason::NotANumber { field } => write!(f, "{} is not a number", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEntry {
    /// Zero-based position of the entry within the submission.
    pub index: usize,
    #[serde(flatten)]
    pub reason: RejectReason,
}

/// Result of parsing a whole submission: accepted workouts in input order
/// plus the entries that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Submission {
    pub accepted: Vec<ParsedWorkout>,
    pub rejected: Vec<RejectedEntry>,
}

/// Split a raw submission into trimmed entry blocks. Empty input yields a
/// single empty block.
pub fn split_entries(raw: &str) -> Vec<&str> {
    raw.split(ENTRY_SEPARATOR).map(str::trim).collect()
}

/// Parse one entry block. Returns `None` when the block has fewer than
/// [`MIN_ENTRY_FIELDS`] lines.
pub fn parse_entry(block: &str) -> Option<ParsedEntry> {
    let fields: Vec<&str> = block.split('\n').map(str::trim).collect();
    if fields.len() < MIN_ENTRY_FIELDS {
        return None;
    }

    let volume = fields[2];
    let sets_text = volume.split(SETS).next().unwrap_or_default();
    let reps_text = volume
        .split(SETS)
        .nth(1)
        .map(|after_sets| after_sets.split(REPS).next().unwrap_or_default());
    let weight_text = fields[3].split(WEIGHT).next().unwrap_or_default();
    let time_text = fields[4].split(TIME).next().unwrap_or_default();

    Some(ParsedEntry {
        category: strip_marker(fields[0]).trim().to_string(),
        workout_name: strip_marker(fields[1]).trim().to_string(),
        sets: leading_int(strip_marker(sets_text).trim()),
        reps: reps_text.and_then(|text| leading_int(text.trim())),
        weight: leading_float(weight_text.trim()),
        time: leading_float(time_text.trim()),
    })
}

/// Run the splitter and entry parser over a submission. Entries with too
/// few lines or a non-numeric sub-field are rejected individually.
pub fn parse_submission(raw: &str) -> Submission {
    let mut submission = Submission::default();
    for (index, block) in split_entries(raw).into_iter().enumerate() {
        let Some(entry) = parse_entry(block) else {
            submission.rejected.push(RejectedEntry {
                index,
                reason: RejectReason::TooFewFields {
                    found: block.split('\n').count(),
                },
            });
            continue;
        };
        match entry.into_workout() {
            Ok(workout) => submission.accepted.push(workout),
            Err(field) => submission.rejected.push(RejectedEntry {
                index,
                reason: RejectReason::NotANumber { field },
            }),
        }
    }
    submission
}

fn strip_marker(field: &str) -> &str {
    let mut chars = field.chars();
    chars.next();
    chars.as_str()
}

/// Numerals wider than an `i64` saturate rather than drop the entry.
fn leading_int(text: &str) -> Option<i64> {
    let numeral = LEADING_INT.find(text)?.as_str();
    Some(numeral.parse().unwrap_or(if numeral.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

fn leading_float(text: &str) -> Option<f64> {
    LEADING_FLOAT.find(text)?.as_str().parse().ok()
}
