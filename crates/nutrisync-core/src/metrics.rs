//! Physiological and nutritional metrics.
//!
//! Everything here is a pure function of its inputs. Callers are expected to
//! pass validated profiles; nothing in this module checks ranges.
//!
//! BMR uses the Mifflin-St Jeor equation (Mifflin et al., 1990,
//! <https://doi.org/10.1093/ajcn/51.2.241>).

use serde::{Deserialize, Serialize};

use crate::model::{DailyLog, Gender, HealthGoal, Profile};

const CM_PER_INCH: f64 = 2.54;
const INCHES_PER_FOOT: f64 = 12.0;

const MSJ_WEIGHT_COEF: f64 = 10.0;
const MSJ_HEIGHT_COEF: f64 = 6.25;
const MSJ_AGE_COEF: f64 = -5.0;
const MSJ_MALE_CONSTANT: f64 = 5.0;
const MSJ_FEMALE_CONSTANT: f64 = -161.0;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Protein requirement band in g per kg of body weight.
const PROTEIN_MIN_G_PER_KG: f64 = 1.6;
const PROTEIN_MAX_G_PER_KG: f64 = 2.2;
/// Intake below this share of the minimum is flagged.
const PROTEIN_DEFICIT_RATIO: f64 = 0.8;
/// Fat above this share of calories is flagged.
const FAT_CALORIE_LIMIT: f64 = 0.35;

/// Height in centimetres.
pub fn height_to_cm(feet: u32, inches: f64) -> f64 {
    (f64::from(feet) * INCHES_PER_FOOT + inches) * CM_PER_INCH
}

/// Body mass index, kg/m².
pub fn bmi(weight_kg: f64, height_feet: u32, height_inches: f64) -> f64 {
    let metres = height_to_cm(height_feet, height_inches) / 100.0;
    weight_kg / (metres * metres)
}

/// Basal metabolic rate in kcal/day.
pub fn bmr(profile: &Profile) -> f64 {
    let height_cm = height_to_cm(profile.height_feet, profile.height_inches);
    let sex_constant = match profile.gender {
        Gender::Male => MSJ_MALE_CONSTANT,
        Gender::Female => MSJ_FEMALE_CONSTANT,
    };

    MSJ_WEIGHT_COEF * profile.weight
        + MSJ_HEIGHT_COEF * height_cm
        + MSJ_AGE_COEF * f64::from(profile.age)
        + sex_constant
}

/// Daily calorie offset applied on top of maintenance for a goal.
pub fn goal_adjustment(goal: HealthGoal) -> f64 {
    match goal {
        HealthGoal::WeightLoss => -500.0,
        HealthGoal::Maintenance => 0.0,
        HealthGoal::WeightGain => 300.0,
    }
}

/// WHO adult BMI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        match bmi {
            b if b < 18.5 => Self::Underweight,
            b if b < 25.0 => Self::Normal,
            b if b < 30.0 => Self::Overweight,
            _ => Self::Obese,
        }
    }
}

/// Sums over one day's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub calcium: f64,
    pub iron: f64,
    pub exercise_calories: f64,
    pub exercise_minutes: f64,
}

impl NutritionTotals {
    pub fn from_log(log: &DailyLog) -> Self {
        let mut totals = log.food.iter().fold(Self::default(), |mut acc, food| {
            acc.calories += food.calories;
            acc.protein += food.protein;
            acc.carbs += food.carbs;
            acc.fat += food.fat;
            acc.fiber += food.fiber;
            acc.calcium += food.calcium;
            acc.iron += food.iron;
            acc
        });

        for session in &log.exercise {
            totals.exercise_calories += session.calories_burned;
            totals.exercise_minutes += session.duration_minutes;
        }

        totals
    }
}

/// Net energy = intake - (BMR + exercise + goal adjustment).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    pub intake: f64,
    pub bmr: f64,
    pub exercise: f64,
    pub adjustment: f64,
    pub target: f64,
    pub net: f64,
}

impl EnergyBalance {
    pub fn compute(profile: &Profile, log: &DailyLog) -> Self {
        let totals = NutritionTotals::from_log(log);
        Self::from_totals(profile, &totals)
    }

    pub fn from_totals(profile: &Profile, totals: &NutritionTotals) -> Self {
        let bmr = bmr(profile);
        let adjustment = goal_adjustment(profile.goal);
        let target = bmr + totals.exercise_calories + adjustment;
        Self {
            intake: totals.calories,
            bmr,
            exercise: totals.exercise_calories,
            adjustment,
            target,
            net: totals.calories - target,
        }
    }
}

/// Daily protein band for a profile, in grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProteinTarget {
    pub min_g: f64,
    pub max_g: f64,
}

impl ProteinTarget {
    pub fn is_deficient(&self, consumed_g: f64) -> bool {
        consumed_g < self.min_g * PROTEIN_DEFICIT_RATIO
    }
}

pub fn protein_target(profile: &Profile) -> ProteinTarget {
    ProteinTarget {
        min_g: profile.weight * PROTEIN_MIN_G_PER_KG,
        max_g: profile.weight * PROTEIN_MAX_G_PER_KG,
    }
}

/// Share of macro calories (0.0 - 1.0) contributed by each macronutrient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroSplit {
    pub fn from_totals(totals: &NutritionTotals) -> Self {
        let protein = totals.protein * KCAL_PER_G_PROTEIN;
        let carbs = totals.carbs * KCAL_PER_G_CARBS;
        let fat = totals.fat * KCAL_PER_G_FAT;
        let total = protein + carbs + fat;

        if total <= 0.0 {
            return Self::default();
        }

        Self {
            protein: protein / total,
            carbs: carbs / total,
            fat: fat / total,
        }
    }

    pub fn fat_excessive(&self) -> bool {
        self.fat > FAT_CALORIE_LIMIT
    }
}

/// Everything derived for one profile and one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub bmr: f64,
    pub totals: NutritionTotals,
    pub energy: EnergyBalance,
    pub protein_target: ProteinTarget,
    pub protein_deficient: bool,
    pub macros: MacroSplit,
    pub fat_excessive: bool,
}

impl DailyReport {
    pub fn build(profile: &Profile, log: &DailyLog) -> Self {
        let bmi = bmi(profile.weight, profile.height_feet, profile.height_inches);
        let totals = NutritionTotals::from_log(log);
        let energy = EnergyBalance::from_totals(profile, &totals);
        let protein_target = protein_target(profile);
        let macros = MacroSplit::from_totals(&totals);

        Self {
            bmi,
            bmi_category: BmiCategory::from_bmi(bmi),
            bmr: energy.bmr,
            totals,
            energy,
            protein_target,
            protein_deficient: protein_target.is_deficient(totals.protein),
            macros,
            fat_excessive: macros.fat_excessive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseEntry, FoodEntry};
    use chrono::NaiveDate;

    fn food(calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodEntry {
        FoodEntry {
            id: "f".to_string(),
            name: "test".to_string(),
            calories,
            protein,
            carbs,
            fat,
            fiber: 1.0,
            calcium: 2.0,
            iron: 3.0,
            timestamp: 0,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_height_to_cm() {
        assert!((height_to_cm(5, 9.0) - 175.26).abs() < 1e-9);
        assert_eq!(height_to_cm(0, 0.0), 0.0);
    }

    #[test]
    fn test_bmi_same_for_feet_inches_and_total_inches() {
        assert_eq!(bmi(75.0, 5, 9.0), bmi(75.0, 0, 69.0));
        assert!((bmi(75.0, 5, 9.0) - 24.42).abs() < 0.01);
    }

    #[test]
    fn test_bmr_mifflin_st_jeor() {
        let male = Profile::default();
        // 10*75 + 6.25*175.26 - 5*28 + 5
        assert!((bmr(&male) - 1710.375).abs() < 1e-6);

        let female = Profile {
            gender: Gender::Female,
            ..Profile::default()
        };
        assert!((bmr(&male) - bmr(&female) - 166.0).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_increases_with_weight() {
        let mut previous = f64::MIN;
        for weight in [40.0, 55.5, 70.0, 92.3, 140.0] {
            let profile = Profile {
                weight,
                ..Profile::default()
            };
            let value = bmr(&profile);
            assert!(value > previous);
            previous = value;
        }
    }

    #[test]
    fn test_bmi_category_bands() {
        assert_eq!(BmiCategory::from_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(22.0), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(27.5), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(31.0), BmiCategory::Obese);
    }

    #[test]
    fn test_totals_and_energy_balance() {
        let mut log = DailyLog::empty(day());
        log.food.push(food(500.0, 30.0, 50.0, 20.0));
        log.food.push(food(300.0, 10.0, 40.0, 10.0));
        log.exercise.push(ExerciseEntry {
            id: "e".to_string(),
            kind: "Walk".to_string(),
            calories_burned: 200.0,
            duration_minutes: 45.0,
            timestamp: 0,
        });

        let totals = NutritionTotals::from_log(&log);
        assert_eq!(totals.calories, 800.0);
        assert_eq!(totals.protein, 40.0);
        assert_eq!(totals.iron, 6.0);
        assert_eq!(totals.exercise_minutes, 45.0);

        let profile = Profile::default();
        let energy = EnergyBalance::compute(&profile, &log);
        assert_eq!(energy.adjustment, -500.0);
        assert!((energy.target - (bmr(&profile) + 200.0 - 500.0)).abs() < 1e-9);
        assert!((energy.net - (800.0 - energy.target)).abs() < 1e-9);
    }

    #[test]
    fn test_macro_split_and_flags() {
        let mut log = DailyLog::empty(day());
        log.food.push(food(600.0, 10.0, 20.0, 40.0));
        let report = DailyReport::build(&Profile::default(), &log);

        // 40 + 80 + 360 = 480 kcal of macros, fat 75%
        assert!((report.macros.fat - 0.75).abs() < 1e-9);
        assert!(report.fat_excessive);
        assert!(report.protein_deficient);
        assert_eq!(report.bmi_category, BmiCategory::Normal);
    }

    #[test]
    fn test_macro_split_empty_day() {
        let split = MacroSplit::from_totals(&NutritionTotals::default());
        assert_eq!(split, MacroSplit::default());
        assert!(!split.fat_excessive());
    }

    #[test]
    fn test_protein_target_band() {
        let target = protein_target(&Profile::default());
        assert!((target.min_g - 120.0).abs() < 1e-9);
        assert!((target.max_g - 165.0).abs() < 1e-9);
        assert!(target.is_deficient(95.0));
        assert!(!target.is_deficient(96.0));
    }
}
