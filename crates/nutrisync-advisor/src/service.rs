//! Advisory service seam and the failure-absorbing wrapper around it.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::AdvisoryContext;
use crate::diagnosis::FoodDiagnosis;
use crate::{AdvisorError, DiagnosisError};

pub const COACH_UNAVAILABLE: &str =
    "I'm having trouble connecting to my knowledge base. Please try again.";
pub const DIAGNOSIS_UNAVAILABLE: &str =
    "Food diagnosis is unavailable right now. Please try again.";

/// Remote text-generation collaborator. Returns raw model text.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn coach(&self, message: &str, ctx: &AdvisoryContext) -> Result<String, AdvisorError>;

    async fn diagnose(&self, food_name: &str, ctx: &AdvisoryContext)
        -> Result<String, AdvisorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoachReply {
    Answer(String),
    /// Service failed; carries the placeholder shown to the user
    Unavailable(String),
}

impl CoachReply {
    pub fn text(&self) -> &str {
        match self {
            CoachReply::Answer(text) | CoachReply::Unavailable(text) => text,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, CoachReply::Answer(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisOutcome {
    Diagnosed(FoodDiagnosis),
    Unavailable(String),
    /// The service answered but the payload was rejected
    Malformed(DiagnosisError),
}

/// Turns service failures into values the caller can show.
///
/// Never touches application state and never retries.
pub struct Advisor<S> {
    service: S,
}

impl<S: AdvisoryService> Advisor<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn coach(&self, message: &str, ctx: &AdvisoryContext) -> CoachReply {
        match self.service.coach(message, ctx).await {
            Ok(text) if !text.trim().is_empty() => CoachReply::Answer(text),
            Ok(_) => {
                warn!("Coach returned an empty answer");
                CoachReply::Unavailable(COACH_UNAVAILABLE.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Coach request failed");
                CoachReply::Unavailable(COACH_UNAVAILABLE.to_string())
            }
        }
    }

    pub async fn diagnose(&self, food_name: &str, ctx: &AdvisoryContext) -> DiagnosisOutcome {
        let raw = match self.service.diagnose(food_name, ctx).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(food = %food_name, error = %e, "Diagnosis request failed");
                return DiagnosisOutcome::Unavailable(DIAGNOSIS_UNAVAILABLE.to_string());
            }
        };

        match FoodDiagnosis::parse(&raw) {
            Ok(diagnosis) => {
                debug!(food = %diagnosis.food_name, status = %diagnosis.health_status, "Diagnosis parsed");
                DiagnosisOutcome::Diagnosed(diagnosis)
            }
            Err(e) => {
                warn!(food = %food_name, error = %e, "Rejected diagnosis payload");
                DiagnosisOutcome::Malformed(e)
            }
        }
    }
}
