use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::store::ProgressStore;
use crate::config::Config;
use crate::metrics::track_backend_operation;
use crate::models::question::QuestionRecord;
use crate::models::{AttributesPatch, TaskCompletion, UserAttributesRecord, UserContext};

const ATTRIBUTES_TABLE: &str = "user_attributes";
const QUESTIONS_TABLE: &str = "questions";
const PROGRESS_TABLE: &str = "task_progress";

/// PostgREST client for the hosted Supabase project.
pub struct SupabaseStore {
    http_client: Client,
    base_url: String,
    anon_key: String,
    timeout: Duration,
}

impl SupabaseStore {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            timeout: Duration::from_secs(config.http_timeout_secs),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder, ctx: &UserContext) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&ctx.access_token)
            .timeout(self.timeout)
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(anyhow!("{} failed with {}: {}", what, status, error_text))
    }

    async fn single_row<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let rows: Vec<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} returned no rows", what))
    }
}

#[async_trait]
impl ProgressStore for SupabaseStore {
    async fn fetch_attributes(&self, ctx: &UserContext) -> Result<UserAttributesRecord> {
        track_backend_operation("fetch_attributes", async {
            let request = self
                .http_client
                .get(self.table_url(ATTRIBUTES_TABLE))
                .query(&[
                    ("user_id", format!("eq.{}", ctx.user_id)),
                    ("select", "*".to_string()),
                ]);

            let response = self
                .authorized(request, ctx)
                .send()
                .await
                .context("Failed to call user_attributes")?;
            let response = Self::ensure_success(response, "Fetching user attributes").await?;
            Self::single_row(response, "user_attributes").await
        })
        .await
    }

    async fn update_attributes(
        &self,
        ctx: &UserContext,
        patch: &AttributesPatch,
    ) -> Result<UserAttributesRecord> {
        track_backend_operation("update_attributes", async {
            tracing::debug!("Patching user_attributes for {}: {:?}", ctx.user_id, patch);

            let request = self
                .http_client
                .patch(self.table_url(ATTRIBUTES_TABLE))
                .query(&[("user_id", format!("eq.{}", ctx.user_id))])
                .header("Prefer", "return=representation")
                .json(patch);

            let response = self
                .authorized(request, ctx)
                .send()
                .await
                .context("Failed to patch user_attributes")?;
            let response = Self::ensure_success(response, "Updating user attributes").await?;
            Self::single_row(response, "user_attributes").await
        })
        .await
    }

    async fn fetch_questions(&self, ctx: &UserContext, task_id: &str) -> Result<Vec<QuestionRecord>> {
        track_backend_operation("fetch_questions", async {
            let request = self
                .http_client
                .get(self.table_url(QUESTIONS_TABLE))
                .query(&[
                    ("task_id", format!("eq.{}", task_id)),
                    ("select", "*".to_string()),
                ]);

            let response = self
                .authorized(request, ctx)
                .send()
                .await
                .context("Failed to call questions")?;
            let response = Self::ensure_success(response, "Fetching questions").await?;
            let records: Vec<QuestionRecord> = response
                .json()
                .await
                .context("Failed to parse questions response")?;

            tracing::info!("Fetched {} questions for task {}", records.len(), task_id);
            Ok(records)
        })
        .await
    }

    async fn record_completion(&self, ctx: &UserContext, completion: &TaskCompletion) -> Result<()> {
        track_backend_operation("record_completion", async {
            let request = self
                .http_client
                .post(self.table_url(PROGRESS_TABLE))
                .header("Prefer", "return=minimal")
                .json(completion);

            let response = self
                .authorized(request, ctx)
                .send()
                .await
                .context("Failed to insert task_progress")?;
            Self::ensure_success(response, "Recording task completion").await?;
            Ok(())
        })
        .await
    }
}
