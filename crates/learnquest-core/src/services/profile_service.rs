use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use super::level_calculator::level_and_progress;
use super::store::ProgressStore;
use super::streak_calculator::{StreakCalculator, StreakOutcome};
use crate::models::{ProfileSummary, StreakPatch, UserAttributes, UserContext};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

pub struct ProfileService {
    store: Arc<dyn ProgressStore>,
    reads: RetryConfig,
    bell_pepper_cap: u32,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProgressStore>, reads: RetryConfig, bell_pepper_cap: u32) -> Self {
        Self {
            store,
            reads,
            bell_pepper_cap,
        }
    }

    /// Fresh, sanitized counters from the backend.
    pub async fn load_attributes(&self, ctx: &UserContext) -> Result<UserAttributes> {
        let record = retry_async_with_config(self.reads.clone(), || async {
            self.store.fetch_attributes(ctx).await
        })
        .await
        .with_context(|| format!("Failed to load attributes for user {}", ctx.user_id))?;

        Ok(UserAttributes::from_record(record, self.bell_pepper_cap))
    }

    pub async fn summary(&self, ctx: &UserContext) -> Result<ProfileSummary> {
        let attrs = self.load_attributes(ctx).await?;
        let progress = level_and_progress(attrs.xp);

        tracing::info!(
            "Profile for {}: level {} ({}/{}), streak {}",
            ctx.user_id,
            progress.level,
            progress.xp_into_level,
            progress.xp_required_for_level,
            attrs.streak
        );

        Ok(ProfileSummary {
            user_id: attrs.user_id,
            points: attrs.points,
            xp: attrs.xp,
            level: progress.level,
            xp_into_level: progress.xp_into_level,
            xp_required_for_level: progress.xp_required_for_level,
            streak: attrs.streak,
            last_task_date: attrs.last_task_date,
            bell_peppers: attrs.bell_peppers.count(),
            bell_pepper_cap: attrs.bell_peppers.cap(),
        })
    }
}

/// Streak columns to write after a completion on `completion_date`, or `None`
/// when the persisted pair is already correct.
pub fn streak_patch(
    attrs: &UserAttributes,
    completion_date: NaiveDate,
    today: NaiveDate,
) -> Option<StreakPatch> {
    let mut calculator = StreakCalculator::initialize_from_database(attrs.last_task_date, attrs.streak);
    let outcome = calculator.update_streak_on(completion_date, attrs.streak, today);

    match outcome {
        StreakOutcome::Rejected | StreakOutcome::Unchanged => None,
        _ => calculator.last_completed_date().map(|last_task_date| StreakPatch {
            streak: calculator.current_streak(),
            last_task_date,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BellPeppers;
    use uuid::Uuid;

    fn attrs(streak: u32, last: Option<NaiveDate>) -> UserAttributes {
        UserAttributes {
            user_id: Uuid::new_v4(),
            points: 0,
            xp: 0,
            streak,
            last_task_date: last,
            bell_peppers: BellPeppers::new(3, 3),
            last_reward_date: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn same_day_completion_writes_nothing() {
        assert_eq!(streak_patch(&attrs(3, Some(day(5))), day(5), day(5)), None);
    }

    #[test]
    fn next_day_completion_extends() {
        assert_eq!(
            streak_patch(&attrs(3, Some(day(5))), day(6), day(6)),
            Some(StreakPatch {
                streak: 4,
                last_task_date: day(6)
            })
        );
    }

    #[test]
    fn first_ever_completion_starts_streak() {
        assert_eq!(
            streak_patch(&attrs(0, None), day(6), day(6)),
            Some(StreakPatch {
                streak: 1,
                last_task_date: day(6)
            })
        );
    }
}
