use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use super::profile_service::ProfileService;
use super::store::ProgressStore;
use crate::error::CoreError;
use crate::metrics::POINTS_AWARDED_TOTAL;
use crate::models::{AttributesPatch, UserAttributes, UserContext};
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use crate::utils::time::today_utc;

#[derive(Debug, Clone, Serialize)]
pub struct DailyRewardResponse {
    pub points_awarded: u64,
    pub total_points: u64,
    pub total_xp: u64,
    pub collected_on: NaiveDate,
}

/// Once-per-day bonus. Points and XP move together.
pub struct RewardService {
    store: Arc<dyn ProgressStore>,
    profiles: ProfileService,
    writes: RetryConfig,
    daily_points: u64,
}

impl RewardService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        reads: RetryConfig,
        writes: RetryConfig,
        bell_pepper_cap: u32,
        daily_points: u64,
    ) -> Self {
        Self {
            profiles: ProfileService::new(store.clone(), reads, bell_pepper_cap),
            store,
            writes,
            daily_points,
        }
    }

    pub async fn collect_daily_reward(&self, ctx: &UserContext) -> Result<DailyRewardResponse> {
        self.collect_daily_reward_on(ctx, today_utc()).await
    }

    pub async fn collect_daily_reward_on(
        &self,
        ctx: &UserContext,
        today: NaiveDate,
    ) -> Result<DailyRewardResponse> {
        let attrs = self.profiles.load_attributes(ctx).await?;
        let patch = daily_reward_patch(&attrs, self.daily_points, today)?;

        retry_async_with_config(self.writes.clone(), || async {
            self.store.update_attributes(ctx, &patch).await
        })
        .await
        .context("Failed to collect daily reward")?;

        POINTS_AWARDED_TOTAL.inc_by(self.daily_points);
        tracing::info!(
            "Daily reward collected by {}: +{} points",
            ctx.user_id,
            self.daily_points
        );

        Ok(DailyRewardResponse {
            points_awarded: self.daily_points,
            total_points: patch.points.unwrap_or(attrs.points),
            total_xp: patch.xp.unwrap_or(attrs.xp),
            collected_on: today,
        })
    }
}

fn daily_reward_patch(
    attrs: &UserAttributes,
    points: u64,
    today: NaiveDate,
) -> Result<AttributesPatch, CoreError> {
    if attrs.last_reward_date == Some(today) {
        return Err(CoreError::RewardAlreadyCollected { date: today });
    }
    Ok(AttributesPatch {
        points: Some(attrs.points + points),
        xp: Some(attrs.xp + points),
        last_reward_date: Some(today),
        ..Default::default()
    })
}
