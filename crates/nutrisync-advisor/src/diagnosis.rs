//! Structured food diagnosis and its validation.

use nutrisync_core::NewFood;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::DiagnosisError;

/// Verdict on a food for the user's goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "Good Choice")]
    GoodChoice,
    #[serde(rename = "Caution")]
    Caution,
    #[serde(rename = "Avoid")]
    Avoid,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodChoice => write!(f, "Good Choice"),
            Self::Caution => write!(f, "Caution"),
            Self::Avoid => write!(f, "Avoid"),
        }
    }
}

/// Grams per portion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

/// Free-text micronutrient notes, e.g. "2.6mg (15% DV)".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Micros {
    #[serde(default, deserialize_with = "note")]
    pub iron: String,
    #[serde(default, deserialize_with = "note")]
    pub calcium: String,
    #[serde(default, deserialize_with = "note")]
    pub vitamins: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDiagnosis {
    pub food_name: String,
    #[serde(default)]
    pub portion: String,
    pub calories: f64,
    pub macros: Macros,
    #[serde(default)]
    pub micros: Micros,
    pub health_status: HealthStatus,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub goal_alignment: String,
    #[serde(default)]
    pub swap_suggestion: String,
    #[serde(default)]
    pub quick_advice: String,
    #[serde(default)]
    pub cumulative_impact: String,
}

impl FoodDiagnosis {
    /// Parse raw model output, tolerating a surrounding markdown code fence.
    pub fn parse(raw: &str) -> Result<Self, DiagnosisError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(DiagnosisError::Json("empty payload".to_string()));
        }

        let diagnosis: FoodDiagnosis =
            serde_json::from_str(body).map_err(|e| DiagnosisError::Json(e.to_string()))?;
        diagnosis.validate()?;
        Ok(diagnosis)
    }

    fn validate(&self) -> Result<(), DiagnosisError> {
        if self.food_name.trim().is_empty() {
            return Err(DiagnosisError::Invalid("food name is empty".to_string()));
        }

        let quantities = [
            ("calories", self.calories),
            ("protein", self.macros.protein),
            ("carbs", self.macros.carbs),
            ("fat", self.macros.fat),
            ("fiber", self.macros.fiber),
        ];
        for (field, value) in quantities {
            if !value.is_finite() || value < 0.0 {
                return Err(DiagnosisError::Invalid(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Food entry for an accepted diagnosis.
    pub fn to_new_food(&self) -> NewFood {
        NewFood {
            name: self.food_name.trim().to_string(),
            calories: self.calories,
            protein: self.macros.protein,
            carbs: self.macros.carbs,
            fat: self.macros.fat,
            fiber: self.macros.fiber,
            calcium: leading_number(&self.micros.calcium),
            iron: leading_number(&self.micros.iron),
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// "18.5mg (10% DV)" -> 18.5; anything without a leading number -> 0.
fn leading_number(note: &str) -> f64 {
    let note = note.trim_start();
    let end = note
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(note.len(), |(i, _)| i);

    note[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Accept notes given as strings or bare numbers.
fn note<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMOSA: &str = r#"{
        "foodName": "Samosa",
        "portion": "1 piece (100g)",
        "calories": 262,
        "macros": { "protein": 4.5, "carbs": 28, "fat": 15, "fiber": 2.1 },
        "micros": { "iron": "1.8mg (10% DV)", "calcium": "25 mg", "vitamins": "Some B vitamins" },
        "healthStatus": "Avoid",
        "explanation": "Deep fried pastry with refined flour.",
        "goalAlignment": "Works against a calorie deficit.",
        "swapSuggestion": "Baked samosa or roasted chana.",
        "quickAdvice": "Limit to occasional treats.",
        "cumulativeImpact": "Adds about 15% of today's target."
    }"#;

    #[test]
    fn test_parse_full_payload() {
        let diagnosis = FoodDiagnosis::parse(SAMOSA).unwrap();
        assert_eq!(diagnosis.food_name, "Samosa");
        assert_eq!(diagnosis.health_status, HealthStatus::Avoid);
        assert_eq!(diagnosis.macros.fat, 15.0);
        assert_eq!(diagnosis.micros.calcium, "25 mg");
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let fenced = format!("```json\n{SAMOSA}\n```");
        assert_eq!(
            FoodDiagnosis::parse(&fenced).unwrap(),
            FoodDiagnosis::parse(SAMOSA).unwrap()
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(matches!(
            FoodDiagnosis::parse(""),
            Err(DiagnosisError::Json(_))
        ));
        assert!(matches!(
            FoodDiagnosis::parse("Sorry, I can't help with that."),
            Err(DiagnosisError::Json(_))
        ));
        assert!(matches!(
            FoodDiagnosis::parse(&SAMOSA.replace("\"Avoid\"", "\"Terrible\"")),
            Err(DiagnosisError::Json(_))
        ));
        assert!(matches!(
            FoodDiagnosis::parse(&SAMOSA.replace("\"calories\": 262", "\"calories\": -5")),
            Err(DiagnosisError::Invalid(_))
        ));
        assert!(matches!(
            FoodDiagnosis::parse(&SAMOSA.replace("\"Samosa\"", "\"  \"")),
            Err(DiagnosisError::Invalid(_))
        ));
    }

    #[test]
    fn test_to_new_food_reads_leading_numbers() {
        let food = FoodDiagnosis::parse(SAMOSA).unwrap().to_new_food();
        assert_eq!(food.name, "Samosa");
        assert_eq!(food.calories, 262.0);
        assert_eq!(food.protein, 4.5);
        assert_eq!(food.iron, 1.8);
        assert_eq!(food.calcium, 25.0);
    }

    #[test]
    fn test_numeric_and_missing_notes() {
        let payload = SAMOSA.replace(
            r#""micros": { "iron": "1.8mg (10% DV)", "calcium": "25 mg", "vitamins": "Some B vitamins" },"#,
            r#""micros": { "iron": 3, "calcium": "Low" },"#,
        );
        let food = FoodDiagnosis::parse(&payload).unwrap().to_new_food();
        assert_eq!(food.iron, 3.0);
        assert_eq!(food.calcium, 0.0);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("12"), 12.0);
        assert_eq!(leading_number("  0.5 mg"), 0.5);
        assert_eq!(leading_number("trace"), 0.0);
        assert_eq!(leading_number(""), 0.0);
        assert_eq!(leading_number(".."), 0.0);
    }
}
