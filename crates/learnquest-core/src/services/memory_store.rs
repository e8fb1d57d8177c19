use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::ProgressStore;
use crate::models::question::QuestionRecord;
use crate::models::{AttributesPatch, TaskCompletion, UserAttributesRecord, UserContext};

/// In-process store for offline runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    attributes: RwLock<HashMap<Uuid, UserAttributesRecord>>,
    questions: RwLock<HashMap<String, Vec<QuestionRecord>>>,
    completions: RwLock<Vec<TaskCompletion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_attributes(&self, record: UserAttributesRecord) {
        self.attributes.write().await.insert(record.user_id, record);
    }

    pub async fn put_questions(&self, task_id: &str, records: Vec<QuestionRecord>) {
        self.questions
            .write()
            .await
            .insert(task_id.to_string(), records);
    }

    pub async fn completions(&self) -> Vec<TaskCompletion> {
        self.completions.read().await.clone()
    }
}

fn apply_patch(record: &mut UserAttributesRecord, patch: &AttributesPatch) {
    if let Some(points) = patch.points {
        record.points = Some(points as i64);
    }
    if let Some(xp) = patch.xp {
        record.xp = Some(xp as i64);
    }
    if let Some(bell_peppers) = patch.bell_peppers {
        record.bell_peppers = Some(bell_peppers as i64);
    }
    if let Some(streak) = patch.streak {
        record.streak = Some(streak.streak as i64);
        record.last_task_date = Some(streak.last_task_date);
    }
    if let Some(date) = patch.last_reward_date {
        record.last_reward_date = Some(date);
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn fetch_attributes(&self, ctx: &UserContext) -> Result<UserAttributesRecord> {
        self.attributes
            .read()
            .await
            .get(&ctx.user_id)
            .cloned()
            .ok_or_else(|| anyhow!("No attributes for user {}", ctx.user_id))
    }

    async fn update_attributes(
        &self,
        ctx: &UserContext,
        patch: &AttributesPatch,
    ) -> Result<UserAttributesRecord> {
        let mut attributes = self.attributes.write().await;
        let record = attributes
            .get_mut(&ctx.user_id)
            .ok_or_else(|| anyhow!("No attributes for user {}", ctx.user_id))?;
        apply_patch(record, patch);
        Ok(record.clone())
    }

    async fn fetch_questions(&self, _ctx: &UserContext, task_id: &str) -> Result<Vec<QuestionRecord>> {
        Ok(self
            .questions
            .read()
            .await
            .get(task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_completion(&self, _ctx: &UserContext, completion: &TaskCompletion) -> Result<()> {
        self.completions.write().await.push(completion.clone());
        Ok(())
    }
}
