//! NutriSync Advisory Collaborator
//!
//! Coaching answers and structured food diagnoses from a remote
//! text-generation service. Failures come back as placeholder values and
//! never touch the application state.

mod context;
mod diagnosis;
mod error;
mod gemini;
mod service;

pub use context::AdvisoryContext;
pub use diagnosis::{FoodDiagnosis, HealthStatus, Macros, Micros};
pub use error::{AdvisorError, DiagnosisError};
pub use gemini::GeminiService;
pub use service::{
    Advisor, AdvisoryService, CoachReply, DiagnosisOutcome, COACH_UNAVAILABLE,
    DIAGNOSIS_UNAVAILABLE,
};
