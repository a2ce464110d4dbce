//! Recent-activity client for the fitness data source.
//!
//! Consumes an already-acquired bearer token; acquiring or refreshing the
//! token is the caller's concern.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.strava.com/api/v3";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity token is empty")]
    MissingToken,

    #[error("activity request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("activity endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// The subset of an activity record passed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffer_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ActivityClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for ActivityClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ActivityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Activities from the last `since_days` days, or the most recent page
    /// when `None`.
    pub async fn recent_activities(
        &self,
        bearer: &str,
        since_days: Option<u32>,
    ) -> Result<Vec<Activity>, ActivityError> {
        let after = since_days.map(|days| Utc::now() - Duration::days(i64::from(days)));
        self.activities_after(bearer, after).await
    }

    pub async fn activities_after(
        &self,
        bearer: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Activity>, ActivityError> {
        if bearer.trim().is_empty() {
            return Err(ActivityError::MissingToken);
        }

        let url = format!("{}/athlete/activities", self.base_url.trim_end_matches('/'));
        let mut query = vec![("per_page", PAGE_SIZE.to_string())];
        if let Some(after) = after {
            query.push(("after", after.timestamp().to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(bearer)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(ActivityError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        let activities: Vec<Activity> = response.json().await?;
        debug!(count = activities.len(), "fetched recent activities");
        Ok(activities)
    }
}

/// Shape activities into the `strava_recent` input blob.
pub fn activities_to_json(activities: &[Activity]) -> Value {
    Value::Array(
        activities
            .iter()
            .map(|a| {
                serde_json::json!({
                    "name": a.name,
                    "type": a.activity_type,
                    "start_date": a.start_date.to_rfc3339(),
                    "suffer_score": a.suffer_score,
                })
            })
            .collect(),
    )
}
