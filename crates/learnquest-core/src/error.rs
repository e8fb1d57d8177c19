use chrono::NaiveDate;

/// Domain failures surfaced to the controller.
///
/// Services wrap these in `anyhow::Error`; callers that need to branch on the
/// kind recover it with `err.downcast_ref::<CoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Not enough bell peppers to start (available: {available})")]
    InsufficientResource { available: u32 },

    #[error("Question {id} is malformed: {reason}")]
    MalformedQuestion { id: String, reason: String },

    #[error("Cannot {action} while session is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Task {task_id} has no questions")]
    EmptyQuestionPool { task_id: String },

    #[error("Daily reward already collected on {date}")]
    RewardAlreadyCollected { date: NaiveDate },
}

impl CoreError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedQuestion {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Conditions the UI should show as a blocking message rather than a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientResource { .. } | CoreError::RewardAlreadyCollected { .. }
        )
    }
}
