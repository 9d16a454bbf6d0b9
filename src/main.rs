// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GymBuddy command-line client
//!
//! Signs in against the GymBuddy API and logs workouts, exercises and sets
//! from the terminal.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gymbuddy_client::{
    config::Config,
    models::{format_month_day, format_sets, format_weight, NewWorkout, SetUpdate, Workout},
    services::WorkoutWithHistory,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gymbuddy", version, about = "Track gym workouts with GymBuddy")]
struct Cli {
    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token
    Login {
        identifier: String,
        #[arg(long, env = "GYMBUDDY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        email: String,
        #[arg(long, env = "GYMBUDDY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Email a password reset link
    ResetPassword { email: String },
    /// Show who is signed in
    Whoami,
    #[command(subcommand)]
    Workouts(WorkoutCommand),
    #[command(subcommand)]
    Exercise(ExerciseCommand),
    #[command(subcommand)]
    Set(SetCommand),
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// List workouts, newest first
    List,
    /// Show a workout with last session's sets for reference
    Show { id: u64 },
    /// Start a workout pre-filled from the latest one
    New {
        /// Day of the workout (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Start empty instead of copying the template
        #[arg(long)]
        empty: bool,
    },
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Add an exercise by name
    Add { workout_id: u64, name: String },
    /// Add a previously done exercise with its last sets
    AddPast { workout_id: u64, exercise_id: u64 },
    /// List exercises done before
    History,
    /// Rename a performed exercise (blank resets)
    Rename { id: u64, name: String },
    Delete { id: u64 },
    /// Leave a note for next time
    Note { id: u64, note: String },
}

#[derive(Subcommand)]
enum SetCommand {
    /// Append a set to a performed exercise in a workout
    Add {
        workout_id: u64,
        performed_exercise_id: u64,
        reps: u32,
        #[arg(long)]
        weight: Option<f64>,
    },
    Edit {
        id: u64,
        reps: u32,
        #[arg(long)]
        weight: Option<f64>,
    },
    Delete { id: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    tracing::debug!(
        api = %config.api_base_url,
        auth = config.auth_method.as_str(),
        "Configuration loaded"
    );

    let state = AppState::from_config(config).context("failed to initialize client")?;
    state
        .session
        .restore()
        .await
        .context("failed to read stored session")?;

    run(&state, cli).await
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    let session = &state.session;
    let workouts = &state.workouts;

    match cli.command {
        Command::Login {
            identifier,
            password,
        } => {
            session.login(&identifier, &password).await?;
            println!("Logged in as {}", session.user_email().await.unwrap_or(identifier));
        }
        Command::Signup { email, password } => {
            session.sign_up(&email, &password).await?;
            println!("Account created for {}", session.user_email().await.unwrap_or(email));
        }
        Command::Logout => {
            session.logout().await?;
            println!("Logged out");
        }
        Command::ResetPassword { email } => {
            session.send_password_reset(&email).await?;
            println!("Password reset email sent to {}", email.trim());
        }
        Command::Whoami => {
            let snapshot = session.snapshot().await;
            let method = session.strategy_name();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&whoami_json(&snapshot, method))?
                );
            } else {
                match snapshot.email() {
                    Some(email) if snapshot.token().is_some() => {
                        println!("{} ({} sign-in)", email, method)
                    }
                    _ if snapshot.token().is_some() => println!("(signed in, {} sign-in)", method),
                    _ => println!("Not logged in"),
                }
            }
        }
        Command::Workouts(command) => match command {
            WorkoutCommand::List => {
                let list = workouts.list_workouts().await.map_err(|e| {
                    if e.is_unauthorized() {
                        anyhow::anyhow!("{}. Session cleared, please log in again", e)
                    } else {
                        e.into()
                    }
                })?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else if list.is_empty() {
                    println!("No workouts yet");
                } else {
                    for workout in &list {
                        print_workout_line(workout);
                    }
                }
            }
            WorkoutCommand::Show { id } => {
                let detail = workouts.workout_with_history(id).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&detail.workout)?);
                } else {
                    print_workout_detail(&detail);
                }
            }
            WorkoutCommand::New {
                date,
                name,
                notes,
                empty,
            } => {
                let day = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                let new = NewWorkout::on_day(day, &name, &notes);
                let created = if empty {
                    workouts.create_workout(&new).await?
                } else {
                    workouts.create_workout_from_template(&new).await?
                };
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&created)?);
                } else {
                    print_workout_line(&created);
                }
            }
            WorkoutCommand::Delete { id } => {
                workouts.delete_workout(id).await?;
                println!("Deleted workout {}", id);
            }
        },
        Command::Exercise(command) => match command {
            ExerciseCommand::Add { workout_id, name } => {
                let workout = workouts.get_workout(workout_id).await?;
                let added = workouts.add_exercise_by_name(&workout, &name).await?;
                println!("Added {} (#{})", added.display_name(), added.id);
            }
            ExerciseCommand::AddPast {
                workout_id,
                exercise_id,
            } => {
                let workout = workouts.get_workout(workout_id).await?;
                let added = workouts.add_past_exercise(&workout, exercise_id).await?;
                println!(
                    "Added {} (#{}) with {} set(s)",
                    added.display_name(),
                    added.id,
                    added.sets.len()
                );
            }
            ExerciseCommand::History => {
                let exercises = workouts.user_exercises().await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&exercises)?);
                } else {
                    for exercise in &exercises {
                        println!("{:>5}  {}", exercise.id, exercise.name);
                    }
                }
            }
            ExerciseCommand::Rename { id, name } => {
                let renamed = workouts.rename_performed_exercise(id, &name).await?;
                println!("Renamed to {}", renamed.display_name());
            }
            ExerciseCommand::Delete { id } => {
                workouts.delete_performed_exercise(id).await?;
                println!("Deleted exercise {}", id);
            }
            ExerciseCommand::Note { id, note } => {
                workouts.save_note_for_next_time(id, &note).await?;
                println!("Note saved");
            }
        },
        Command::Set(command) => match command {
            SetCommand::Add {
                workout_id,
                performed_exercise_id,
                reps,
                weight,
            } => {
                let workout = workouts.get_workout(workout_id).await?;
                let Some(exercise) = workout
                    .exercises
                    .iter()
                    .find(|e| e.id == performed_exercise_id)
                else {
                    bail!(
                        "workout {} has no exercise #{}",
                        workout_id,
                        performed_exercise_id
                    );
                };
                let set = workouts.append_set(exercise, reps, weight).await?;
                println!("Added set {} to {}", set.order, exercise.display_name());
            }
            SetCommand::Edit { id, reps, weight } => {
                let set = workouts.update_set(id, &SetUpdate { reps, weight }).await?;
                println!("Set {} is now {} reps", set.id, set.reps);
            }
            SetCommand::Delete { id } => {
                workouts.delete_set(id).await?;
                println!("Deleted set {}", id);
            }
        },
    }

    Ok(())
}

fn whoami_json(session: &gymbuddy_client::models::Session, method: &str) -> serde_json::Value {
    serde_json::json!({
        "state": session.state(),
        "method": method,
        "email": session.email(),
        "auth_error": session.auth_error(),
    })
}

fn print_workout_line(workout: &Workout) {
    let date = format_month_day(&workout.date);
    let name = if workout.name.is_empty() {
        date.as_str()
    } else {
        workout.name.as_str()
    };
    println!(
        "{:>5}  {}  {}  ({} exercises)",
        workout.id,
        date,
        name,
        workout.exercises.len()
    );
}

fn print_workout_detail(detail: &WorkoutWithHistory) {
    let workout = &detail.workout;
    print_workout_line(workout);
    if !workout.notes.is_empty() {
        println!("       {}", workout.notes);
    }

    for exercise in &workout.exercises {
        println!("  #{} {}", exercise.id, exercise.display_name());
        if !exercise.note_for_next_time.is_empty() {
            println!("      note: {}", exercise.note_for_next_time);
        }
        if let Some(last) = format_sets(detail.last_sets_for(exercise.exercise.id)) {
            println!("      last time: {}", last);
        }
        for set in &exercise.sets {
            match set.weight {
                Some(weight) => println!(
                    "      [{}] {} reps @ {}lbs (set #{})",
                    set.order,
                    set.reps,
                    format_weight(weight),
                    set.id
                ),
                None => println!("      [{}] {} reps (set #{})", set.order, set.reps, set.id),
            }
        }
    }
}

/// Initialize logging to stderr, JSON when `GYMBUDDY_LOG_FORMAT=json`.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gymbuddy_client=warn,gymbuddy=warn"));

    let json = std::env::var("GYMBUDDY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
