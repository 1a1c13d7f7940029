//! Hosted remote store speaking the PostgREST dialect (Supabase).
//!
//! Tables:
//! - `profiles(id, name, age, weight, height_feet, height_inches, gender, goal, updated_at)`
//! - `daily_logs(profile_id, date, food, exercise, hydration, sleep_hours, sedentary_hours)`
//!   with a unique constraint on `(profile_id, date)`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nutrisync_core::{
    DailyLog, ExerciseEntry, FoodEntry, Gender, HealthGoal, Profile, ProfileId, RemoteConfig,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::RemoteStore;
use crate::RemoteError;

/// PostgREST code for "the result contains 0 rows" on a single-row select.
const NO_ROWS_CODE: &str = "PGRST116";

const PROFILES_TABLE: &str = "profiles";
const LOGS_TABLE: &str = "daily_logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProfileRow {
    id: ProfileId,
    name: String,
    age: u32,
    weight: f64,
    height_feet: u32,
    height_inches: f64,
    gender: Gender,
    goal: HealthGoal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
    fn new(id: ProfileId, profile: &Profile, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: profile.name.clone(),
            age: profile.age,
            weight: profile.weight,
            height_feet: profile.height_feet,
            height_inches: profile.height_inches,
            gender: profile.gender,
            goal: profile.goal,
            updated_at: Some(updated_at),
        }
    }

    fn into_profile(self) -> Profile {
        Profile {
            name: self.name,
            age: self.age,
            weight: self.weight,
            height_feet: self.height_feet,
            height_inches: self.height_inches,
            gender: self.gender,
            goal: self.goal,
        }
    }
}

/// Nullable columns default to empty/zero when read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LogRow {
    profile_id: ProfileId,
    date: NaiveDate,
    #[serde(default)]
    food: Option<Vec<FoodEntry>>,
    #[serde(default)]
    exercise: Option<Vec<ExerciseEntry>>,
    #[serde(default)]
    hydration: Option<f64>,
    #[serde(default)]
    sleep_hours: Option<f64>,
    #[serde(default)]
    sedentary_hours: Option<f64>,
}

impl LogRow {
    fn new(id: ProfileId, log: &DailyLog) -> Self {
        Self {
            profile_id: id,
            date: log.date,
            food: Some(log.food.clone()),
            exercise: Some(log.exercise.clone()),
            hydration: Some(log.hydration),
            sleep_hours: Some(log.sleep_hours),
            sedentary_hours: Some(log.sedentary_hours),
        }
    }

    fn into_log(self) -> DailyLog {
        DailyLog {
            date: self.date,
            food: self.food.unwrap_or_default(),
            exercise: self.exercise.unwrap_or_default(),
            hydration: self.hydration.unwrap_or_default(),
            sleep_hours: self.sleep_hours.unwrap_or_default(),
            sedentary_hours: self.sedentary_hours.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Remote store over the PostgREST HTTP interface.
pub struct PostgrestRemote {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestRemote {
    /// Build a client for `url` authenticated with `api_key`.
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build from configuration. Fails when the endpoint or key is missing.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        match (config.url.as_deref(), config.api_key.as_deref()) {
            (Some(url), Some(key)) if config.is_configured() => {
                Self::new(url, key, Duration::from_secs(config.timeout_secs))
            }
            _ => Err(RemoteError::Unavailable(
                "remote endpoint or key not configured".to_string(),
            )),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        conflict_target: &str,
        row: &T,
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_target)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);

        let response = self.authorized(request).send().await?;
        check_status(response).await.map(|_| ())
    }
}

/// Turn a non-success response into a [`RemoteError`], mapping the
/// "no rows" code to `NotFound`.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status.as_u16(), &body))
}

fn classify_error(status: u16, body: &str) -> RemoteError {
    let parsed: Option<ApiError> = serde_json::from_str(body).ok();
    if let Some(api) = &parsed {
        if api.code.as_deref() == Some(NO_ROWS_CODE) {
            return RemoteError::NotFound;
        }
    }

    let message = parsed
        .and_then(|api| api.message)
        .unwrap_or_else(|| body.to_string());
    warn!(status, message = %message, "Remote request failed");
    RemoteError::Http { status, message }
}

#[async_trait]
impl RemoteStore for PostgrestRemote {
    async fn fetch_profile(&self, id: ProfileId) -> Result<Profile, RemoteError> {
        let request = self
            .client
            .get(self.table_url(PROFILES_TABLE))
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())]);

        let response = check_status(self.authorized(request).send().await?).await?;
        let rows: Vec<ProfileRow> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        debug!(rows = rows.len(), "Fetched profile rows");

        rows.into_iter()
            .next()
            .map(ProfileRow::into_profile)
            .ok_or(RemoteError::NotFound)
    }

    async fn fetch_logs(&self, id: ProfileId) -> Result<Vec<DailyLog>, RemoteError> {
        let request = self.client.get(self.table_url(LOGS_TABLE)).query(&[
            ("profile_id", format!("eq.{id}")),
            ("select", "*".to_string()),
        ]);

        let response = check_status(self.authorized(request).send().await?).await?;
        let rows: Vec<LogRow> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        debug!(rows = rows.len(), "Fetched daily log rows");

        Ok(rows.into_iter().map(LogRow::into_log).collect())
    }

    async fn upsert_profile(&self, id: ProfileId, profile: &Profile) -> Result<(), RemoteError> {
        let row = ProfileRow::new(id, profile, Utc::now());
        self.upsert(PROFILES_TABLE, "id", &row).await
    }

    async fn upsert_log(&self, id: ProfileId, log: &DailyLog) -> Result<(), RemoteError> {
        let row = LogRow::new(id, log);
        self.upsert(LOGS_TABLE, "profile_id,date", &row).await
    }
}
