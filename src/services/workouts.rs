// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed workout operations over the request gateway.
//!
//! Every call reads the current token from the session manager. Failures are
//! always returned; nothing is swallowed. Multi-step flows run their calls
//! one after another with no rollback, so a failure part way leaves the
//! earlier steps in place on the server.

use crate::error::{ApiError, Result};
use crate::models::{
    next_order, Exercise, NewPerformedExercise, NewSet, NewWorkout, NoteForNextTime,
    PerformedExercise, PerformedExerciseUpdate, SetEntry, SetUpdate, TemplateExercise, Workout,
    WorkoutList, WorkoutUpdate,
};
use crate::services::api::{ApiClient, Method, RequestOptions};
use crate::services::session::SessionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A workout together with the previous session's exercises.
#[derive(Debug, Clone)]
pub struct WorkoutWithHistory {
    pub workout: Workout,
    pub previous: Vec<TemplateExercise>,
}

impl WorkoutWithHistory {
    /// Sets recorded for `exercise_id` in the previous session.
    pub fn last_sets_for(&self, exercise_id: u64) -> &[SetEntry] {
        self.previous
            .iter()
            .find(|p| p.exercise.id == exercise_id)
            .map(|p| p.last_sets.as_slice())
            .unwrap_or(&[])
    }
}

/// Workout API bound to a session.
#[derive(Clone)]
pub struct WorkoutsApi {
    api: ApiClient,
    session: Arc<SessionManager>,
    cancel: Option<CancellationToken>,
}

impl WorkoutsApi {
    pub fn new(api: ApiClient, session: Arc<SessionManager>) -> Self {
        Self {
            api,
            session,
            cancel: None,
        }
    }

    /// Copy of this API whose calls give up when `cancel` fires.
    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel: Some(cancel),
            ..self.clone()
        }
    }

    async fn token(&self) -> Result<String> {
        self.session.token().await.ok_or(ApiError::NotLoggedIn)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let token = self.token().await?;
        self.call_as(&token, method, path).await
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        token: &str,
        method: Method,
        path: &str,
    ) -> Result<T> {
        let options = RequestOptions::new(method)
            .token(Some(token))
            .cancel(self.cancel.as_ref());
        self.api.request(path, options).await
    }

    async fn call_with<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let token = self.token().await?;
        let options = RequestOptions::new(method)
            .json(body)?
            .token(Some(&token))
            .cancel(self.cancel.as_ref());
        self.api.request(path, options).await
    }

    // ─── Workouts ────────────────────────────────────────────────────────────

    /// List the user's workouts, newest first.
    ///
    /// A 401 here means the token sent is stale, so the session is ended
    /// unless a newer login has replaced that token in the meantime.
    pub async fn list_workouts(&self) -> Result<Vec<Workout>> {
        let token = self.token().await?;
        match self
            .call_as::<WorkoutList>(&token, Method::Get, "/workouts/")
            .await
        {
            Ok(list) => Ok(list.into_vec()),
            Err(e) if e.is_unauthorized() => {
                if let Err(logout_err) = self.session.handle_unauthorized(&token).await {
                    tracing::warn!(error = %logout_err, "Failed to clear rejected session");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_workout(&self, workout_id: u64) -> Result<Workout> {
        self.call(Method::Get, &format!("/workouts/{}/", workout_id))
            .await
    }

    pub async fn create_workout(&self, workout: &NewWorkout) -> Result<Workout> {
        let created: Workout = self.call_with(Method::Post, "/workouts/", workout).await?;
        tracing::info!(workout_id = created.id, "Workout created");
        Ok(created)
    }

    pub async fn update_workout(&self, workout_id: u64, update: &WorkoutUpdate) -> Result<Workout> {
        self.call_with(Method::Patch, &format!("/workouts/{}/", workout_id), update)
            .await
    }

    pub async fn delete_workout(&self, workout_id: u64) -> Result<()> {
        self.call(Method::Delete, &format!("/workouts/{}/", workout_id))
            .await
    }

    /// Exercises of the session before `workout_id`, with their sets.
    pub async fn previous_exercises(&self, workout_id: u64) -> Result<Vec<TemplateExercise>> {
        self.call(
            Method::Get,
            &format!("/workouts/{}/previous_exercises/", workout_id),
        )
        .await
    }

    /// The most recent workout's exercises, used to pre-fill a new one.
    pub async fn template(&self) -> Result<Vec<TemplateExercise>> {
        self.call(Method::Get, "/workouts/template/").await
    }

    /// Exercise types the user has done before.
    pub async fn user_exercises(&self) -> Result<Vec<Exercise>> {
        self.call(Method::Get, "/workouts/user_exercises/").await
    }

    /// The last time the user did `exercise_id`, with its sets.
    pub async fn last_exercise_performance(&self, exercise_id: u64) -> Result<TemplateExercise> {
        self.call(
            Method::Get,
            &format!(
                "/workouts/last_exercise_performance/?exercise_id={}",
                exercise_id
            ),
        )
        .await
    }

    /// Fetch a workout and the previous session's exercises concurrently.
    pub async fn workout_with_history(&self, workout_id: u64) -> Result<WorkoutWithHistory> {
        let (workout, previous) = tokio::try_join!(
            self.get_workout(workout_id),
            self.previous_exercises(workout_id)
        )?;
        Ok(WorkoutWithHistory { workout, previous })
    }

    // ─── Performed exercises ─────────────────────────────────────────────────

    pub async fn add_exercise(
        &self,
        workout_id: u64,
        exercise: &NewPerformedExercise,
    ) -> Result<PerformedExercise> {
        self.call_with(
            Method::Post,
            &format!("/workouts/{}/exercises/", workout_id),
            exercise,
        )
        .await
    }

    /// Set the user's name for a performed exercise; blank resets it.
    pub async fn rename_performed_exercise(
        &self,
        performed_exercise_id: u64,
        name: &str,
    ) -> Result<PerformedExercise> {
        let update = PerformedExerciseUpdate {
            user_preferred_name: name.trim().to_string(),
        };
        self.call_with(
            Method::Patch,
            &format!("/performed-exercises/{}/", performed_exercise_id),
            &update,
        )
        .await
    }

    pub async fn delete_performed_exercise(&self, performed_exercise_id: u64) -> Result<()> {
        self.call(
            Method::Delete,
            &format!("/performed-exercises/{}/", performed_exercise_id),
        )
        .await
    }

    /// Leave a note shown the next time this exercise type comes up.
    pub async fn save_note_for_next_time(
        &self,
        performed_exercise_id: u64,
        note: &str,
    ) -> Result<()> {
        let note = note.trim();
        if note.is_empty() {
            return Err(ApiError::InvalidRequest("note is empty".to_string()));
        }
        let body = NoteForNextTime {
            note: note.to_string(),
        };
        let _: serde_json::Value = self
            .call_with(
                Method::Post,
                &format!(
                    "/performed-exercises/{}/note_for_next_time/",
                    performed_exercise_id
                ),
                &body,
            )
            .await?;
        Ok(())
    }

    // ─── Sets ────────────────────────────────────────────────────────────────

    pub async fn add_set(&self, performed_exercise_id: u64, set: &NewSet) -> Result<SetEntry> {
        self.call_with(
            Method::Post,
            &format!("/performed-exercises/{}/sets/", performed_exercise_id),
            set,
        )
        .await
    }

    pub async fn update_set(&self, set_id: u64, update: &SetUpdate) -> Result<SetEntry> {
        self.call_with(Method::Patch, &format!("/set-entries/{}/", set_id), update)
            .await
    }

    pub async fn delete_set(&self, set_id: u64) -> Result<()> {
        self.call(Method::Delete, &format!("/set-entries/{}/", set_id))
            .await
    }

    // ─── Multi-step flows ────────────────────────────────────────────────────

    /// Create a workout and copy the latest template's exercises into it.
    ///
    /// Template sets are not copied; they stay available as "last time"
    /// reference through `previous_exercises`.
    pub async fn create_workout_from_template(&self, workout: &NewWorkout) -> Result<Workout> {
        let template = self.template().await?;
        let created = self.create_workout(workout).await?;

        for item in &template {
            let exercise = NewPerformedExercise::by_id(
                item.exercise.id,
                item.order,
                &item.user_preferred_name,
            );
            self.add_exercise(created.id, &exercise).await?;
        }

        tracing::info!(
            workout_id = created.id,
            exercises = template.len(),
            "Workout created from template"
        );

        if template.is_empty() {
            Ok(created)
        } else {
            self.get_workout(created.id).await
        }
    }

    /// Add a free-text exercise at the end of a workout.
    pub async fn add_exercise_by_name(
        &self,
        workout: &Workout,
        name: &str,
    ) -> Result<PerformedExercise> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "exercise name is empty".to_string(),
            ));
        }
        let order = next_order(workout.exercises.iter().map(|e| e.order));
        self.add_exercise(workout.id, &NewPerformedExercise::by_name(name, order))
            .await
    }

    /// Add an exercise the user has done before, pre-filled with the sets
    /// from its last performance.
    ///
    /// A failed history lookup just means there is nothing to copy.
    pub async fn add_past_exercise(
        &self,
        workout: &Workout,
        exercise_id: u64,
    ) -> Result<PerformedExercise> {
        let order = next_order(workout.exercises.iter().map(|e| e.order));

        let last = match self.last_exercise_performance(exercise_id).await {
            Ok(last) => Some(last),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                tracing::debug!(exercise_id, error = %e, "No previous performance found");
                None
            }
        };

        let preferred_name = last
            .as_ref()
            .map(|l| l.user_preferred_name.as_str())
            .unwrap_or("");
        let created = self
            .add_exercise(
                workout.id,
                &NewPerformedExercise::by_id(exercise_id, order, preferred_name),
            )
            .await?;

        let last_sets = last.map(|l| l.last_sets).unwrap_or_default();
        let mut sets = Vec::with_capacity(last_sets.len());
        for (index, previous) in last_sets.iter().enumerate() {
            let set = NewSet {
                order: index as u32 + 1,
                reps: previous.reps,
                weight: previous.weight,
                notes: previous.notes.clone(),
            };
            sets.push(self.add_set(created.id, &set).await?);
        }

        Ok(PerformedExercise { sets, ..created })
    }

    /// Append a set after the exercise's current sets.
    pub async fn append_set(
        &self,
        exercise: &PerformedExercise,
        reps: u32,
        weight: Option<f64>,
    ) -> Result<SetEntry> {
        let set = NewSet {
            order: next_order(exercise.sets.iter().map(|s| s.order)),
            reps,
            weight,
            notes: String::new(),
        };
        self.add_set(exercise.id, &set).await
    }
}
