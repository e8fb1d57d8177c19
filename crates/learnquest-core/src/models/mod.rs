use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

pub mod question;
pub mod session;

/// Signed-in user for a single call chain.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub access_token: String,
}

impl UserContext {
    pub fn new(user_id: Uuid, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: access_token.into(),
        }
    }
}

/// Row of the remote `user_attributes` table as it comes over the wire.
///
/// Counters are signed because the remote store does not enforce ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAttributesRecord {
    pub user_id: Uuid,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub streak: Option<i64>,
    #[serde(default)]
    pub last_task_date: Option<NaiveDate>,
    #[serde(default)]
    pub bell_peppers: Option<i64>,
    #[serde(default)]
    pub last_reward_date: Option<NaiveDate>,
}

/// Sanitized user counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAttributes {
    pub user_id: Uuid,
    pub points: u64,
    pub xp: u64,
    pub streak: u32,
    pub last_task_date: Option<NaiveDate>,
    pub bell_peppers: BellPeppers,
    pub last_reward_date: Option<NaiveDate>,
}

impl UserAttributes {
    pub fn from_record(record: UserAttributesRecord, bell_pepper_cap: u32) -> Self {
        Self {
            user_id: record.user_id,
            points: clamp_non_negative(record.points),
            xp: clamp_non_negative(record.xp),
            streak: clamp_non_negative(record.streak).min(u32::MAX as u64) as u32,
            last_task_date: record.last_task_date,
            bell_peppers: BellPeppers::new(
                clamp_non_negative(record.bell_peppers).min(u32::MAX as u64) as u32,
                bell_pepper_cap,
            ),
            last_reward_date: record.last_reward_date,
        }
    }
}

fn clamp_non_negative(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

/// Partial update of `user_attributes`; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bell_peppers: Option<u32>,
    #[serde(flatten)]
    pub streak: Option<StreakPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reward_date: Option<NaiveDate>,
}

/// Streak and its date always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakPatch {
    pub streak: u32,
    pub last_task_date: NaiveDate,
}

impl AttributesPatch {
    pub fn is_empty(&self) -> bool {
        self == &AttributesPatch::default()
    }
}

/// Gating resource spent to start or retry a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BellPeppers {
    count: u32,
    cap: u32,
}

impl BellPeppers {
    pub const DEFAULT_CAP: u32 = 3;

    pub fn new(count: u32, cap: u32) -> Self {
        Self {
            count: count.min(cap),
            cap,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn consume(&mut self) -> Result<(), CoreError> {
        if self.count == 0 {
            return Err(CoreError::InsufficientResource { available: 0 });
        }
        self.count -= 1;
        Ok(())
    }

    pub fn refund(&mut self) {
        self.count = (self.count + 1).min(self.cap);
    }
}

/// Row appended to `task_progress` when a task attempt completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub user_id: Uuid,
    pub task_id: String,
    pub session_id: Uuid,
    pub points: u64,
    pub rounds: u32,
    pub perfect: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub user_id: Uuid,
    pub points: u64,
    pub xp: u64,
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_required_for_level: u64,
    pub streak: u32,
    pub last_task_date: Option<NaiveDate>,
    pub bell_peppers: u32,
    pub bell_pepper_cap: u32,
}
