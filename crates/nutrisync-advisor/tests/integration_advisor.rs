//! Integration tests for the advisor wrapper with a scripted service.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tempfile::tempdir;

use nutrisync_advisor::{
    Advisor, AdvisorError, AdvisoryContext, AdvisoryService, CoachReply, DiagnosisError,
    DiagnosisOutcome, HealthStatus, COACH_UNAVAILABLE, DIAGNOSIS_UNAVAILABLE,
};
use nutrisync_core::{AppState, FixedClock};
use nutrisync_sync::{FileCache, Reconciler, StateStore};

/// Replays canned answers and records the prompts it was given
#[derive(Default)]
struct ScriptedService {
    answers: Mutex<VecDeque<Result<String, AdvisorError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn answering(answers: Vec<Result<String, AdvisorError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn next(&self, prompt: String) -> Result<String, AdvisorError> {
        self.seen.lock().push(prompt);
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(Err(AdvisorError::EmptyResponse))
    }
}

#[async_trait]
impl AdvisoryService for ScriptedService {
    async fn coach(&self, message: &str, ctx: &AdvisoryContext) -> Result<String, AdvisorError> {
        self.next(ctx.coach_prompt(message))
    }

    async fn diagnose(
        &self,
        food_name: &str,
        ctx: &AdvisoryContext,
    ) -> Result<String, AdvisorError> {
        self.next(ctx.diagnosis_prompt(food_name))
    }
}

const PANEER: &str = r#"```json
{
  "foodName": "Paneer Tikka",
  "portion": "6 pieces (150g)",
  "calories": 320,
  "macros": { "protein": 21, "carbs": 8, "fat": 23, "fiber": 1.5 },
  "micros": { "iron": "0.9mg", "calcium": "480mg (37% DV)", "vitamins": "B12, A" },
  "healthStatus": "Good Choice",
  "explanation": "Grilled, high protein.",
  "goalAlignment": "Supports satiety in a deficit.",
  "swapSuggestion": "Use low-fat paneer.",
  "quickAdvice": "Pair with salad.",
  "cumulativeImpact": "Covers a third of today's protein."
}
```"#;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

#[tokio::test]
async fn test_coach_failure_yields_placeholder() {
    let advisor = Advisor::new(ScriptedService::answering(vec![
        Ok("Drink more water.".to_string()),
        Err(AdvisorError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }),
        Ok("   ".to_string()),
    ]));
    let ctx = AdvisoryContext::from_state(&AppState::default(), today());

    let reply = advisor.coach("How am I doing?", &ctx).await;
    assert_eq!(reply, CoachReply::Answer("Drink more water.".to_string()));

    let reply = advisor.coach("How am I doing?", &ctx).await;
    assert!(!reply.is_answer());
    assert_eq!(reply.text(), COACH_UNAVAILABLE);

    let reply = advisor.coach("Hello?", &ctx).await;
    assert_eq!(reply.text(), COACH_UNAVAILABLE);

    let seen = advisor.service().seen.lock();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].contains("USER QUERY: How am I doing?"));
}

#[tokio::test]
async fn test_diagnose_outcomes() {
    let advisor = Advisor::new(ScriptedService::answering(vec![
        Ok(PANEER.to_string()),
        Ok("{\"foodName\": \"Mystery\"}".to_string()),
        Err(AdvisorError::Http("connection reset".to_string())),
    ]));
    let ctx = AdvisoryContext::from_state(&AppState::default(), today());

    match advisor.diagnose("paneer tikka", &ctx).await {
        DiagnosisOutcome::Diagnosed(d) => {
            assert_eq!(d.food_name, "Paneer Tikka");
            assert_eq!(d.health_status, HealthStatus::GoodChoice);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(matches!(
        advisor.diagnose("mystery", &ctx).await,
        DiagnosisOutcome::Malformed(DiagnosisError::Json(_))
    ));

    assert_eq!(
        advisor.diagnose("anything", &ctx).await,
        DiagnosisOutcome::Unavailable(DIAGNOSIS_UNAVAILABLE.to_string())
    );
}

#[tokio::test]
async fn test_accepted_diagnosis_enters_through_the_store() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(FileCache::new(dir.path().join("state.json")));
    let store = StateStore::new(
        Reconciler::new(cache),
        Arc::new(FixedClock::on(today())),
    );
    store.load().await.unwrap();

    let advisor = Advisor::new(ScriptedService::answering(vec![Ok(PANEER.to_string())]));
    let before = store.snapshot().unwrap();
    let ctx = AdvisoryContext::from_state(&before, today());

    let DiagnosisOutcome::Diagnosed(diagnosis) = advisor.diagnose("paneer tikka", &ctx).await
    else {
        panic!("expected a diagnosis");
    };

    // Diagnosing alone changes nothing
    assert_eq!(store.snapshot().unwrap(), before);

    let receipt = store.add_food_today(diagnosis.to_new_food()).await.unwrap();
    let log = receipt.applied.logs.get(today()).unwrap();
    assert_eq!(log.food.len(), 1);
    assert_eq!(log.food[0].name, "Paneer Tikka");
    assert_eq!(log.food[0].calories, 320.0);
    assert_eq!(log.food[0].iron, 0.9);
    assert_eq!(log.food[0].calcium, 480.0);

    // Context for the next request sees the new intake
    let ctx = AdvisoryContext::from_state(&store.snapshot().unwrap(), today());
    assert_eq!(ctx.energy.intake, 320.0);
}
