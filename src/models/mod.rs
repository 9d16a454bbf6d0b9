// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod session;
pub mod workout;

pub use session::{AuthGrant, Session, SessionState, TokenResponse};
pub use workout::{
    format_month_day, format_sets, format_weight, next_order, Exercise, NewPerformedExercise,
    NewSet, NewWorkout, NoteForNextTime, PerformedExercise, PerformedExerciseUpdate, SetEntry,
    SetUpdate, TemplateExercise, Workout, WorkoutList, WorkoutUpdate,
};
