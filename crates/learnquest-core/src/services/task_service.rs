use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use super::profile_service::{streak_patch, ProfileService};
use super::store::ProgressStore;
use super::task_engine::TaskSession;
use crate::error::CoreError;
use crate::metrics::{POINTS_AWARDED_TOTAL, TASK_SESSIONS_TOTAL};
use crate::models::question::Question;
use crate::models::session::{AnswerInput, AnswerOutcome, Evaluation, TaskReward};
use crate::models::{AttributesPatch, TaskCompletion, UserContext};
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use crate::utils::time::today_utc;

/// Drives task sessions and persists their effects.
///
/// Every transition runs on a copy of the session; the caller's session is
/// only replaced once the backend has confirmed the writes, so a failed write
/// leaves local state untouched.
pub struct TaskService {
    store: Arc<dyn ProgressStore>,
    profiles: ProfileService,
    reads: RetryConfig,
    writes: RetryConfig,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        reads: RetryConfig,
        writes: RetryConfig,
        bell_pepper_cap: u32,
    ) -> Self {
        Self {
            profiles: ProfileService::new(store.clone(), reads.clone(), bell_pepper_cap),
            store,
            reads,
            writes,
        }
    }

    pub async fn start_task(&self, ctx: &UserContext, task_id: &str) -> Result<TaskSession> {
        tracing::info!("Starting task {} for user {}", task_id, ctx.user_id);

        let attrs = self.profiles.load_attributes(ctx).await?;
        let questions = self.load_questions(ctx, task_id).await?;
        let mut session = TaskSession::new(task_id, questions, attrs.bell_peppers)?;

        if let Err(e) = session.start() {
            TASK_SESSIONS_TOTAL.with_label_values(&["rejected"]).inc();
            tracing::info!("Task {} not started for {}: {}", task_id, ctx.user_id, e);
            return Err(e.into());
        }

        self.persist_bell_peppers(ctx, &session).await?;

        TASK_SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        tracing::info!(
            "Session {} started: {} questions, {} bell pepper(s) left",
            session.id(),
            session.pool_size(),
            session.bell_peppers().count()
        );
        Ok(session)
    }

    pub async fn submit_answer(
        &self,
        ctx: &UserContext,
        session: &mut TaskSession,
        input: &AnswerInput,
    ) -> Result<(Evaluation, AnswerOutcome)> {
        let mut next = session.clone();
        let (evaluation, outcome) = next.submit(input)?;

        match outcome {
            AnswerOutcome::Completed { reward, rounds } => {
                self.persist_completion(ctx, &mut next, reward, rounds).await?;
                TASK_SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
            }
            AnswerOutcome::RoundFailed { round, wrong } => {
                TASK_SESSIONS_TOTAL.with_label_values(&["round_failed"]).inc();
                tracing::info!(
                    "Session {} round {} failed with {} wrong answer(s)",
                    next.id(),
                    round,
                    wrong
                );
            }
            AnswerOutcome::Next { .. } => {}
        }

        *session = next;
        Ok((evaluation, outcome))
    }

    /// Spends a fresh bell pepper and replays the questions missed last round.
    pub async fn retry_round(&self, ctx: &UserContext, session: &mut TaskSession) -> Result<()> {
        let attrs = self.profiles.load_attributes(ctx).await?;
        let mut next = session.clone();
        next.sync_bell_peppers(attrs.bell_peppers);

        if let Err(e) = next.retry() {
            if matches!(e, CoreError::InsufficientResource { .. }) {
                TASK_SESSIONS_TOTAL.with_label_values(&["rejected"]).inc();
            }
            return Err(e.into());
        }

        self.persist_bell_peppers(ctx, &next).await?;

        TASK_SESSIONS_TOTAL.with_label_values(&["retried"]).inc();
        tracing::info!(
            "Session {} retrying round {} for user {}",
            next.id(),
            next.round_number(),
            ctx.user_id
        );
        *session = next;
        Ok(())
    }

    /// Exit before completion. Nothing is refunded and nothing is written.
    pub fn abandon(&self, session: &mut TaskSession) -> Result<()> {
        session.abandon()?;
        TASK_SESSIONS_TOTAL.with_label_values(&["abandoned"]).inc();
        tracing::info!("Session {} abandoned", session.id());
        Ok(())
    }

    async fn load_questions(&self, ctx: &UserContext, task_id: &str) -> Result<Vec<Question>> {
        let records = retry_async_with_config(self.reads.clone(), || async {
            self.store.fetch_questions(ctx, task_id).await
        })
        .await
        .with_context(|| format!("Failed to load questions for task {}", task_id))?;

        // One malformed question fails the whole task rather than being mis-scored.
        let questions = records
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(questions)
    }

    async fn persist_bell_peppers(&self, ctx: &UserContext, session: &TaskSession) -> Result<()> {
        let patch = AttributesPatch {
            bell_peppers: Some(session.bell_peppers().count()),
            ..Default::default()
        };
        retry_async_with_config(self.writes.clone(), || async {
            self.store.update_attributes(ctx, &patch).await
        })
        .await
        .context("Failed to persist bell peppers")?;
        Ok(())
    }

    async fn persist_completion(
        &self,
        ctx: &UserContext,
        session: &mut TaskSession,
        reward: TaskReward,
        rounds: u32,
    ) -> Result<()> {
        // Counters are re-read so the backend stays the source of truth.
        let attrs = self.profiles.load_attributes(ctx).await?;
        let today = today_utc();

        let mut bell_peppers = attrs.bell_peppers;
        bell_peppers.refund();

        let patch = AttributesPatch {
            points: Some(attrs.points + reward.points),
            xp: Some(attrs.xp + reward.points),
            bell_peppers: Some(bell_peppers.count()),
            streak: streak_patch(&attrs, today, today),
            last_reward_date: None,
        };

        retry_async_with_config(self.writes.clone(), || async {
            self.store.update_attributes(ctx, &patch).await
        })
        .await
        .context("Failed to persist task rewards")?;

        session.sync_bell_peppers(bell_peppers);
        POINTS_AWARDED_TOTAL.inc_by(reward.points);

        let completion = TaskCompletion {
            user_id: ctx.user_id,
            task_id: session.task_id().to_string(),
            session_id: session.id(),
            points: reward.points,
            rounds,
            perfect: reward.perfect,
            completed_at: Utc::now(),
        };
        // History row only; counters above are already committed.
        if let Err(e) = retry_async_with_config(self.writes.clone(), || async {
            self.store.record_completion(ctx, &completion).await
        })
        .await
        {
            tracing::error!(
                "Failed to record completion of session {}: {:#}",
                session.id(),
                e
            );
        }

        tracing::info!(
            "Session {} completed by {}: +{} points in {} round(s)",
            session.id(),
            ctx.user_id,
            reward.points,
            rounds
        );
        Ok(())
    }
}
