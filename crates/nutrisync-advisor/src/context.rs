//! Read-only payload handed to the advisory service.

use chrono::NaiveDate;
use nutrisync_core::log::find_log_for_date;
use nutrisync_core::{bmi, AppState, DailyLog, EnergyBalance, Profile};
use serde::Serialize;

/// Profile, derived metrics and today's log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryContext {
    pub profile: Profile,
    pub today: NaiveDate,
    pub bmi: f64,
    pub bmr: f64,
    pub energy: EnergyBalance,
    pub log: DailyLog,
}

impl AdvisoryContext {
    /// Snapshot `state` for `today`. A day without a log gets an empty one.
    pub fn from_state(state: &AppState, today: NaiveDate) -> Self {
        let log = find_log_for_date(state, today)
            .cloned()
            .unwrap_or_else(|| DailyLog::empty(today));
        let profile = state.profile.clone();
        let energy = EnergyBalance::compute(&profile, &log);

        Self {
            bmi: bmi(profile.weight, profile.height_feet, profile.height_inches),
            bmr: energy.bmr,
            energy,
            today,
            log,
            profile,
        }
    }

    /// User message wrapped with the profile and today's activity.
    pub fn coach_prompt(&self, message: &str) -> String {
        let food = serde_json::to_string(&self.log.food).unwrap_or_else(|_| "[]".to_string());
        let exercise =
            serde_json::to_string(&self.log.exercise).unwrap_or_else(|_| "[]".to_string());

        format!(
            "USER DATA:\n\
             Name: {name}, Age: {age}, Weight: {weight}kg, Goal: {goal}\n\
             BMI: {bmi:.1}, BMR: {bmr:.0}\n\
             Net energy today: {net:.0} kcal (intake {intake:.0}, target {target:.0})\n\
             TODAY'S LOGS ({today}):\n\
             Food: {food}\n\
             Exercise: {exercise}\n\
             Hydration: {hydration}ml\n\
             \n\
             USER QUERY: {message}",
            name = self.profile.name,
            age = self.profile.age,
            weight = self.profile.weight,
            goal = self.profile.goal,
            bmi = self.bmi,
            bmr = self.bmr,
            net = self.energy.net,
            intake = self.energy.intake,
            target = self.energy.target,
            today = self.today,
            hydration = self.log.hydration,
        )
    }

    /// Diagnosis request for one food.
    pub fn diagnosis_prompt(&self, food_name: &str) -> String {
        format!(
            "Diagnose: \"{food_name}\"\n\
             User Goal: {goal}\n\
             User Weight: {weight}kg\n\
             User BMR: {bmr:.0}\n\
             Calories already eaten today: {intake:.0}",
            goal = self.profile.goal,
            weight = self.profile.weight,
            bmr = self.bmr,
            intake = self.energy.intake,
        )
    }
}
