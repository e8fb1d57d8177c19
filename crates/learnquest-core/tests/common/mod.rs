#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use learnquest_core::config::Config;
use learnquest_core::models::question::{Question, QuestionPayload, QuestionRecord};
use learnquest_core::models::session::AnswerInput;
use learnquest_core::models::{
    AttributesPatch, TaskCompletion, UserAttributesRecord, UserContext,
};
use learnquest_core::services::memory_store::MemoryStore;
use learnquest_core::services::store::ProgressStore;
use learnquest_core::AppState;
use uuid::Uuid;

pub const TASK_ID: &str = "borrow-checker-basics";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn test_config() -> Config {
    Config {
        retry_attempts: 3,
        retry_delay_ms: 1,
        ..Config::default()
    }
}

pub fn true_false_records(n: usize) -> Vec<QuestionRecord> {
    (0..n)
        .map(|i| QuestionRecord {
            id: format!("q{}", i),
            task_id: TASK_ID.to_string(),
            question_type: "true_false".to_string(),
            prompt: format!("Statement {}", i),
            correct_bool: Some(i % 2 == 0),
            ..Default::default()
        })
        .collect()
}

pub fn correct_input(question: &Question) -> AnswerInput {
    match &question.payload {
        QuestionPayload::TrueFalse { correct } => AnswerInput::Boolean(*correct),
        QuestionPayload::OpenEnded { correct_answer } => AnswerInput::Text(correct_answer.clone()),
        QuestionPayload::BugReport { correct_text, .. } => AnswerInput::Text(correct_text.clone()),
        QuestionPayload::PressMistakes { mistakes, .. } => AnswerInput::Positions(mistakes.clone()),
        QuestionPayload::MultipleChoice { options } => AnswerInput::Choice(
            options.iter().position(|o| o.is_correct).unwrap(),
        ),
        QuestionPayload::FlipCard { .. } => AnswerInput::Acknowledge,
    }
}

pub fn wrong_input(question: &Question) -> AnswerInput {
    match &question.payload {
        QuestionPayload::TrueFalse { correct } => AnswerInput::Boolean(!*correct),
        _ => AnswerInput::Text("definitely wrong".to_string()),
    }
}

/// Store seeded with one user and a pool of true/false questions.
pub async fn seeded_store(bell_peppers: i64, questions: usize) -> (Arc<MemoryStore>, UserContext) {
    let store = Arc::new(MemoryStore::new());
    let ctx = UserContext::new(Uuid::new_v4(), "test-token");

    store
        .put_attributes(UserAttributesRecord {
            user_id: ctx.user_id,
            points: Some(0),
            xp: Some(0),
            streak: Some(0),
            bell_peppers: Some(bell_peppers),
            ..Default::default()
        })
        .await;
    store.put_questions(TASK_ID, true_false_records(questions)).await;

    (store, ctx)
}

pub fn app_state(store: Arc<dyn ProgressStore>) -> AppState {
    AppState::with_store(test_config(), store)
}

/// Wraps a store and fails the next `n` attribute writes.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    failures_left: AtomicUsize,
    pub write_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_writes(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProgressStore for FlakyStore {
    async fn fetch_attributes(&self, ctx: &UserContext) -> anyhow::Result<UserAttributesRecord> {
        self.inner.fetch_attributes(ctx).await
    }

    async fn update_attributes(
        &self,
        ctx: &UserContext,
        patch: &AttributesPatch,
    ) -> anyhow::Result<UserAttributesRecord> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("503 Service Unavailable"));
        }
        self.inner.update_attributes(ctx, patch).await
    }

    async fn fetch_questions(
        &self,
        ctx: &UserContext,
        task_id: &str,
    ) -> anyhow::Result<Vec<QuestionRecord>> {
        self.inner.fetch_questions(ctx, task_id).await
    }

    async fn record_completion(
        &self,
        ctx: &UserContext,
        completion: &TaskCompletion,
    ) -> anyhow::Result<()> {
        self.inner.record_completion(ctx, completion).await
    }
}
