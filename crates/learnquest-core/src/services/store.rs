use async_trait::async_trait;

use crate::models::question::QuestionRecord;
use crate::models::{AttributesPatch, TaskCompletion, UserAttributesRecord, UserContext};

/// Remote persistence for user counters, question pools and completions.
///
/// Implementations return raw records; sanitizing (clamping, payload checks)
/// happens in the services.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn fetch_attributes(&self, ctx: &UserContext) -> anyhow::Result<UserAttributesRecord>;

    async fn update_attributes(
        &self,
        ctx: &UserContext,
        patch: &AttributesPatch,
    ) -> anyhow::Result<UserAttributesRecord>;

    async fn fetch_questions(
        &self,
        ctx: &UserContext,
        task_id: &str,
    ) -> anyhow::Result<Vec<QuestionRecord>>;

    async fn record_completion(
        &self,
        ctx: &UserContext,
        completion: &TaskCompletion,
    ) -> anyhow::Result<()>;
}
