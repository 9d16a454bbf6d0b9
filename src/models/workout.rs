// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout wire types for the GymBuddy API.
//!
//! Response types are lenient about missing optional fields; request
//! payloads serialize exactly the fields each endpoint expects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Exercise type from the master list (Bench Press, Squat, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One set of an exercise, with reps and optional weight (lbs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub id: u64,
    pub order: u32,
    pub reps: u32,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// An exercise instance attached to a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedExercise {
    pub id: u64,
    pub exercise: Exercise,
    #[serde(default)]
    pub user_preferred_name: String,
    pub order: u32,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    /// Note left last time for this exercise type
    #[serde(default)]
    pub note_for_next_time: String,
}

impl PerformedExercise {
    /// Name to show: the user's preferred name, else the exercise name.
    pub fn display_name(&self) -> &str {
        if self.user_preferred_name.trim().is_empty() {
            &self.exercise.name
        } else {
            &self.user_preferred_name
        }
    }
}

/// One workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: u64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub date_display: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub exercises: Vec<PerformedExercise>,
    #[serde(default)]
    pub program: Option<u64>,
}

/// A previous session's exercise with its sets, used to pre-fill a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub exercise: Exercise,
    #[serde(default)]
    pub user_preferred_name: String,
    pub order: u32,
    #[serde(default)]
    pub last_sets: Vec<SetEntry>,
}

/// Workout list body: the API may or may not paginate.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkoutList {
    Plain(Vec<Workout>),
    Paginated {
        #[serde(default)]
        results: Vec<Workout>,
    },
}

impl WorkoutList {
    pub fn into_vec(self) -> Vec<Workout> {
        match self {
            WorkoutList::Plain(workouts) => workouts,
            WorkoutList::Paginated { results } => results,
        }
    }
}

// ─── Request payloads ───────────────────────────────────────────────────────

/// `POST /workouts/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewWorkout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    pub name: String,
    pub notes: String,
}

impl NewWorkout {
    /// A workout logged at noon UTC on `day`, named after the day when
    /// `name` is blank.
    pub fn on_day(day: NaiveDate, name: &str, notes: &str) -> Self {
        let date = day
            .and_hms_opt(12, 0, 0)
            .map(|noon| noon.and_utc())
            .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN).and_utc());
        let name = name.trim();
        Self {
            date: Some(date),
            name: if name.is_empty() {
                format_month_day(&date)
            } else {
                name.to_string()
            },
            notes: notes.trim().to_string(),
        }
    }
}

/// `PATCH /workouts/{id}/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkoutUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// `POST /workouts/{id}/exercises/`
///
/// Either an existing exercise id or a free-text name; the backend creates
/// unknown names on the fly.
#[derive(Debug, Clone, Serialize)]
pub struct NewPerformedExercise {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    pub order: u32,
    pub user_preferred_name: String,
}

impl NewPerformedExercise {
    pub fn by_id(exercise_id: u64, order: u32, user_preferred_name: &str) -> Self {
        Self {
            exercise: Some(exercise_id),
            exercise_name: None,
            order,
            user_preferred_name: user_preferred_name.to_string(),
        }
    }

    pub fn by_name(name: &str, order: u32) -> Self {
        Self {
            exercise: None,
            exercise_name: Some(name.trim().to_string()),
            order,
            user_preferred_name: String::new(),
        }
    }
}

/// `POST /performed-exercises/{id}/sets/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSet {
    pub order: u32,
    pub reps: u32,
    pub weight: Option<f64>,
    pub notes: String,
}

/// `PATCH /set-entries/{id}/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetUpdate {
    pub reps: u32,
    pub weight: Option<f64>,
}

/// `PATCH /performed-exercises/{id}/`
#[derive(Debug, Clone, Serialize)]
pub struct PerformedExerciseUpdate {
    pub user_preferred_name: String,
}

/// `POST /performed-exercises/{id}/note_for_next_time/`
#[derive(Debug, Clone, Serialize)]
pub struct NoteForNextTime {
    pub note: String,
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Next free position after `orders`: max + 1, or 1 when empty.
pub fn next_order<I>(orders: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    orders.into_iter().max().map_or(1, |max| max + 1)
}

/// `MM/DD` label for a workout date.
pub fn format_month_day(date: &DateTime<Utc>) -> String {
    date.format("%m/%d").to_string()
}

/// One-line summary of sets, e.g. `10 reps @ 135lbs, 8 reps`.
pub fn format_sets(sets: &[SetEntry]) -> Option<String> {
    if sets.is_empty() {
        return None;
    }

    let parts: Vec<String> = sets
        .iter()
        .map(|set| match set.weight.filter(|w| *w != 0.0) {
            Some(weight) => format!("{} reps @ {}lbs", set.reps, format_weight(weight)),
            None => format!("{} reps", set.reps),
        })
        .collect();

    Some(parts.join(", "))
}

/// Trim trailing zeros: `135.00` → `135`, `137.50` → `137.5`.
pub fn format_weight(weight: f64) -> String {
    let text = format!("{:.2}", weight);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Weights arrive as decimal strings (`"135.00"`), numbers, or null.
fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid weight '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid weight {}",
            other
        ))),
    }
}
