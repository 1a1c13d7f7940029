//! Advisory service backed by the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use nutrisync_core::AdvisorConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::context::AdvisoryContext;
use crate::service::AdvisoryService;
use crate::AdvisorError;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const COACH_INSTRUCTION: &str = "\
You are an evidence-based health, nutrition and lifestyle coach. \
Be scientific, supportive, honest and always actionable, and respect both \
South Asian and international diets.

Rules:
1. Net energy = intake - (BMR + exercise +/- goal adjustment).
2. Protein target is 1.6-2.2 g per kg body weight; flag intake below 80% of it. \
Suggest cutting fat when it exceeds 35% of calories.
3. Flag deep fried, sugary or ultra-processed items and explain their metabolic impact.
4. Score diet quality from 0 to 100 internally; below 60, give a correction plan.
5. Answer with these sections: Quick Health Snapshot, Energy Balance Insight, \
Diet Quality Evaluation, Risk Flags (if any), Exact Action Steps, Short Motivational Close.

Never diagnose medical conditions, never suggest extreme restriction, never body-shame.";

const DIAGNOSIS_INSTRUCTION: &str = "\
You are a food diagnosis engine. Audit the requested food for the user's goal. \
Respond with JSON only, in exactly this shape:
{
  \"foodName\": \"string\",
  \"portion\": \"string\",
  \"calories\": number,
  \"macros\": { \"protein\": number, \"carbs\": number, \"fat\": number, \"fiber\": number },
  \"micros\": { \"iron\": \"string\", \"calcium\": \"string\", \"vitamins\": \"string\" },
  \"healthStatus\": \"Good Choice\" | \"Caution\" | \"Avoid\",
  \"explanation\": \"string\",
  \"goalAlignment\": \"string\",
  \"swapSuggestion\": \"string\",
  \"quickAdvice\": \"string\",
  \"cumulativeImpact\": \"string\"
}";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// Gemini-backed [`AdvisoryService`].
pub struct GeminiService {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

impl GeminiService {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdvisorError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Build from configuration; a missing or blank key is `NotConfigured`.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::new(key, &config.model, config.temperature),
            _ => Err(AdvisorError::NotConfigured),
        }
    }

    /// Point at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn build_request(
        prompt: String,
        instruction: &str,
        generation_config: GenerationConfig,
    ) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content::text(Some("user"), prompt)],
            system_instruction: Content::text(None, instruction),
            generation_config,
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, AdvisorError> {
        debug!(model = %self.model, "Sending request to Gemini API");

        let response = self
            .client
            .post(self.build_url())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(map_api_error(status.as_u16(), &body));
        }

        extract_text(&body)
    }
}

fn map_api_error(status: u16, body: &str) -> AdvisorError {
    let message = serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.to_string(), |e| e.message);
    AdvisorError::Api { status, message }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, AdvisorError> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|e| AdvisorError::Api {
        status: 200,
        message: format!("Failed to parse response: {e}"),
    })?;

    if let Some(error) = response.error {
        return Err(AdvisorError::Api {
            status: 200,
            message: error.message,
        });
    }

    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AdvisorError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl AdvisoryService for GeminiService {
    async fn coach(&self, message: &str, ctx: &AdvisoryContext) -> Result<String, AdvisorError> {
        let request = Self::build_request(
            ctx.coach_prompt(message),
            COACH_INSTRUCTION,
            GenerationConfig {
                temperature: Some(self.temperature),
                response_mime_type: None,
            },
        );
        self.generate(&request).await
    }

    async fn diagnose(
        &self,
        food_name: &str,
        ctx: &AdvisoryContext,
    ) -> Result<String, AdvisorError> {
        let request = Self::build_request(
            ctx.diagnosis_prompt(food_name),
            DIAGNOSIS_INSTRUCTION,
            GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json"),
            },
        );
        self.generate(&request).await
    }
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key() {
        let config = AdvisorConfig {
            api_key: Some("   ".to_string()),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
        };
        assert!(matches!(
            GeminiService::from_config(&config),
            Err(AdvisorError::NotConfigured)
        ));

        let config = AdvisorConfig {
            api_key: Some("k".to_string()),
            ..config
        };
        let service = GeminiService::from_config(&config)
            .unwrap()
            .with_base_url("http://localhost:9/");
        assert_eq!(
            service.build_url(),
            "http://localhost:9/models/gemini-2.5-flash:generateContent?key=k"
        );
        assert!(!format!("{service:?}").contains("\"k\""));
    }

    #[test]
    fn test_diagnosis_request_asks_for_json() {
        let request = GeminiService::build_request(
            "Diagnose: \"Apple\"".to_string(),
            DIAGNOSIS_INSTRUCTION,
            GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json"),
            },
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["generation_config"]["response_mime_type"],
            "application/json"
        );
        assert!(value["generation_config"].get("temperature").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Diagnose: \"Apple\"");
        assert!(value["system_instruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("healthStatus"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Drink "},{"text":"water."}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Drink water.");
    }

    #[test]
    fn test_extract_text_empty_and_error() {
        assert!(matches!(
            extract_text(r#"{"candidates":[]}"#),
            Err(AdvisorError::EmptyResponse)
        ));
        assert!(matches!(
            extract_text(r#"{"error":{"message":"quota"}}"#),
            Err(AdvisorError::Api { .. })
        ));
    }

    #[test]
    fn test_map_api_error_prefers_message() {
        match map_api_error(429, r#"{"error":{"message":"Resource exhausted"}}"#) {
            AdvisorError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match map_api_error(500, "oops") {
            AdvisorError::Api { message, .. } => assert_eq!(message, "oops"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
