//! Entity types shared by every NutriSync component.
//!
//! Serialized field names follow the camelCase layout of the cached snapshot
//! so an existing `amar_health_state` blob parses without migration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::clock::Clock;
use crate::CoreError;

/// Identity of the profile that owns all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    /// The fixed pseudo-user every record belongs to.
    pub const GUEST: ProfileId = ProfileId(Uuid::nil());
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::GUEST
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Biological sex used by the BMR formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// What the user is working towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthGoal {
    #[serde(rename = "Weight Loss")]
    WeightLoss,
    #[serde(rename = "Maintenance")]
    Maintenance,
    #[serde(rename = "Weight Gain")]
    WeightGain,
}

impl fmt::Display for HealthGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeightLoss => write!(f, "Weight Loss"),
            Self::Maintenance => write!(f, "Maintenance"),
            Self::WeightGain => write!(f, "Weight Gain"),
        }
    }
}

/// The single user's static health attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub age: u32,
    /// Body weight in kilograms
    pub weight: f64,
    pub height_feet: u32,
    pub height_inches: f64,
    pub gender: Gender,
    pub goal: HealthGoal,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Guest User".to_string(),
            age: 28,
            weight: 75.0,
            height_feet: 5,
            height_inches: 9.0,
            gender: Gender::Male,
            goal: HealthGoal::WeightLoss,
        }
    }
}

impl Profile {
    /// Check the profile invariants (positive age and weight).
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.age == 0 {
            return Err(CoreError::InvalidProfile(
                "age must be positive".to_string(),
            ));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(CoreError::InvalidProfile(
                "weight must be positive".to_string(),
            ));
        }
        if !self.height_inches.is_finite() || self.height_inches < 0.0 {
            return Err(CoreError::InvalidProfile(
                "height inches cannot be negative".to_string(),
            ));
        }
        if self.height_feet == 0 && self.height_inches == 0.0 {
            return Err(CoreError::InvalidProfile(
                "height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Food as entered by the user or accepted from a diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFood {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub calcium: f64,
    pub iron: f64,
}

/// A recorded food item. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub calcium: f64,
    pub iron: f64,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
}

impl FoodEntry {
    /// Stamp a new food with a fresh id and the clock's current time.
    pub fn record(food: NewFood, clock: &dyn Clock) -> Self {
        Self {
            id: new_entry_id(),
            name: food.name,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            fiber: food.fiber,
            calcium: food.calcium,
            iron: food.iron,
            timestamp: clock.now_millis(),
        }
    }

    /// The user-supplied part of the entry.
    pub fn nutrients(&self) -> NewFood {
        NewFood {
            name: self.name.clone(),
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber: self.fiber,
            calcium: self.calcium,
            iron: self.iron,
        }
    }
}

/// Exercise as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExercise {
    #[serde(rename = "type")]
    pub kind: String,
    pub calories_burned: f64,
    pub duration_minutes: f64,
}

/// A recorded exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub calories_burned: f64,
    pub duration_minutes: f64,
    pub timestamp: i64,
}

impl ExerciseEntry {
    pub fn record(exercise: NewExercise, clock: &dyn Clock) -> Self {
        Self {
            id: new_entry_id(),
            kind: exercise.kind,
            calories_burned: exercise.calories_burned,
            duration_minutes: exercise.duration_minutes,
            timestamp: clock.now_millis(),
        }
    }
}

/// Per-calendar-date aggregate of consumption and activity.
///
/// `hydration`, `sleep_hours` and `sedentary_hours` are whole-day values:
/// a write replaces them, callers accumulate by reading first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub food: Vec<FoodEntry>,
    #[serde(default)]
    pub exercise: Vec<ExerciseEntry>,
    /// Water intake in millilitres
    #[serde(default)]
    pub hydration: f64,
    #[serde(default)]
    pub sleep_hours: f64,
    #[serde(default)]
    pub sedentary_hours: f64,
}

impl DailyLog {
    /// An empty log for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            food: Vec::new(),
            exercise: Vec::new(),
            hydration: 0.0,
            sleep_hours: 0.0,
            sedentary_hours: 0.0,
        }
    }

    pub fn with_hydration(&self, ml: f64) -> Self {
        Self {
            hydration: ml,
            ..self.clone()
        }
    }

    /// Read-modify-write helper: current hydration plus `ml`.
    pub fn add_hydration(&self, ml: f64) -> Self {
        self.with_hydration(self.hydration + ml)
    }

    pub fn with_sleep_hours(&self, hours: f64) -> Self {
        Self {
            sleep_hours: hours,
            ..self.clone()
        }
    }

    pub fn with_sedentary_hours(&self, hours: f64) -> Self {
        Self {
            sedentary_hours: hours,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.food.is_empty()
            && self.exercise.is_empty()
            && self.hydration == 0.0
            && self.sleep_hours == 0.0
            && self.sedentary_hours == 0.0
    }
}

/// Daily logs keyed by date; at most one log per date.
///
/// Serialized as a date-ordered list. When a list with repeated dates is
/// read back, the later log wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DailyLog>", into = "Vec<DailyLog>")]
pub struct LogBook {
    by_date: BTreeMap<NaiveDate, DailyLog>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.by_date.get(&date)
    }

    /// Insert or overwrite the log for its date. Returns the previous value.
    pub fn upsert(&mut self, log: DailyLog) -> Option<DailyLog> {
        self.by_date.insert(log.date, log)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Logs in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = &DailyLog> {
        self.by_date.values()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }
}

impl From<Vec<DailyLog>> for LogBook {
    fn from(logs: Vec<DailyLog>) -> Self {
        logs.into_iter().collect()
    }
}

impl From<LogBook> for Vec<DailyLog> {
    fn from(book: LogBook) -> Self {
        book.by_date.into_values().collect()
    }
}

impl FromIterator<DailyLog> for LogBook {
    fn from_iter<I: IntoIterator<Item = DailyLog>>(iter: I) -> Self {
        let mut book = LogBook::new();
        for log in iter {
            book.upsert(log);
        }
        book
    }
}

/// The canonical snapshot: one profile plus its logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(alias = "user")]
    pub profile: Profile,
    #[serde(default)]
    pub logs: LogBook,
}

impl AppState {
    pub fn new(profile: Profile, logs: LogBook) -> Self {
        Self { profile, logs }
    }
}

fn new_entry_id() -> String {
    Uuid::new_v4().simple().to_string()
}
