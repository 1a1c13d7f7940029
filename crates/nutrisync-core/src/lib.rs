//! NutriSync Core Components
//!
//! This crate provides the entity model, the metrics engine and the daily
//! log operations shared by the sync layer and the advisory collaborator.

pub mod clock;
mod config;
mod error;
pub mod log;
pub mod metrics;
mod model;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AdvisorConfig, AppConfig, RemoteConfig};
pub use error::CoreError;
pub use metrics::{
    bmi, bmr, height_to_cm, BmiCategory, DailyReport, EnergyBalance, MacroSplit,
    NutritionTotals, ProteinTarget,
};
pub use model::{
    AppState, DailyLog, ExerciseEntry, FoodEntry, Gender, HealthGoal, LogBook, NewExercise,
    NewFood, Profile, ProfileId,
};
