use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Initial,
    InProgress { round: u32 },
    RoundFailed { round: u32 },
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initial => "initial",
            SessionStatus::InProgress { .. } => "in_progress",
            SessionStatus::RoundFailed { .. } => "round_failed",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }
}

/// What the user did on the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerInput {
    Choice(usize),
    Boolean(bool),
    Text(String),
    Positions(BTreeSet<usize>),
    Acknowledge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Correct,
    Incorrect,
    /// Information-only questions (flip cards).
    Unscored,
}

impl Evaluation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Evaluation::Correct => "correct",
            Evaluation::Incorrect => "incorrect",
            Evaluation::Unscored => "unscored",
        }
    }

    /// Whether the round engine should count the answer as passed.
    pub fn passes(&self) -> bool {
        !matches!(self, Evaluation::Incorrect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReward {
    pub points: u64,
    pub correct_count: usize,
    pub perfect: bool,
}

impl TaskReward {
    pub const BASE_POINTS: u64 = 50;
    pub const POINTS_PER_CORRECT: u64 = 10;
    pub const PERFECT_BONUS: u64 = 50;

    pub fn calculate(correct_count: usize, pool_size: usize) -> Self {
        let perfect = pool_size > 0 && correct_count == pool_size;
        let mut points = Self::BASE_POINTS + Self::POINTS_PER_CORRECT * correct_count as u64;
        if perfect {
            points += Self::PERFECT_BONUS;
        }
        Self {
            points,
            correct_count,
            perfect,
        }
    }
}

/// Result of feeding one answer into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Next { remaining: usize },
    RoundFailed { round: u32, wrong: usize },
    Completed { reward: TaskReward, rounds: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_adds_perfect_bonus_only_for_full_pool() {
        assert_eq!(TaskReward::calculate(4, 4).points, 140);
        assert_eq!(TaskReward::calculate(3, 4).points, 80);
        assert!(!TaskReward::calculate(0, 0).perfect);
    }

    #[test]
    fn flip_cards_pass_without_being_correct() {
        assert!(Evaluation::Unscored.passes());
        assert!(!Evaluation::Incorrect.passes());
    }
}
