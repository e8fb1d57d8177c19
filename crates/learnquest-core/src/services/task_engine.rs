use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

use super::answer_evaluator;
use crate::error::CoreError;
use crate::models::question::Question;
use crate::models::session::{AnswerInput, AnswerOutcome, Evaluation, SessionStatus, TaskReward};
use crate::models::BellPeppers;

/// One task attempt: rounds of questions until a round has no wrong answers.
///
/// Transitions:
/// - `start` consumes a bell pepper and queues the whole shuffled pool.
/// - Every answer is recorded; at the end of a round the wrong ones either
///   fail the round or, if there are none, complete the task.
/// - `retry` consumes another bell pepper and queues only the questions
///   missed in the failed round.
/// - Completion refunds one bell pepper; `abandon` never does.
#[derive(Debug, Clone)]
pub struct TaskSession {
    id: Uuid,
    task_id: String,
    pool: Vec<Question>,
    round: Vec<usize>,
    position: usize,
    round_number: u32,
    status: SessionStatus,
    bell_peppers: BellPeppers,
    correct_ever: HashSet<String>,
    wrong_ever: HashSet<String>,
    wrong_this_round: Vec<usize>,
    reward: Option<TaskReward>,
}

impl TaskSession {
    pub fn new(
        task_id: impl Into<String>,
        questions: Vec<Question>,
        bell_peppers: BellPeppers,
    ) -> Result<Self, CoreError> {
        let task_id = task_id.into();
        if questions.is_empty() {
            return Err(CoreError::EmptyQuestionPool { task_id });
        }

        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.as_str()) {
                return Err(CoreError::malformed(
                    question.id.clone(),
                    format!("duplicate id in task {}", task_id),
                ));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            task_id,
            pool: questions,
            round: Vec::new(),
            position: 0,
            round_number: 0,
            status: SessionStatus::Initial,
            bell_peppers,
            correct_ever: HashSet::new(),
            wrong_ever: HashSet::new(),
            wrong_this_round: Vec::new(),
            reward: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn bell_peppers(&self) -> BellPeppers {
        self.bell_peppers
    }

    /// Replaces the local count with a freshly read one before a transition.
    pub fn sync_bell_peppers(&mut self, bell_peppers: BellPeppers) {
        self.bell_peppers = bell_peppers;
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn reward(&self) -> Option<TaskReward> {
        self.reward
    }

    /// Questions queued for the current round, in presentation order.
    pub fn round_questions(&self) -> impl Iterator<Item = &Question> {
        self.round.iter().map(move |&i| &self.pool[i])
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.status {
            SessionStatus::InProgress { .. } => {
                self.round.get(self.position).map(|&i| &self.pool[i])
            }
            _ => None,
        }
    }

    pub fn correct_ids(&self) -> &HashSet<String> {
        &self.correct_ever
    }

    pub fn ever_wrong_ids(&self) -> &HashSet<String> {
        &self.wrong_ever
    }

    pub fn wrong_this_round(&self) -> impl Iterator<Item = &str> {
        self.wrong_this_round
            .iter()
            .map(move |&i| self.pool[i].id.as_str())
    }

    pub fn start(&mut self) -> Result<(), CoreError> {
        self.start_with_rng(&mut rand::rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), CoreError> {
        if self.status != SessionStatus::Initial {
            return Err(self.invalid("start"));
        }
        self.bell_peppers.consume()?;

        self.pool.shuffle(rng);
        self.round = (0..self.pool.len()).collect();
        self.position = 0;
        self.round_number = 1;
        self.correct_ever.clear();
        self.wrong_ever.clear();
        self.wrong_this_round.clear();
        self.status = SessionStatus::InProgress { round: 1 };

        tracing::debug!(
            "Session {} started task {} with {} questions",
            self.id,
            self.task_id,
            self.pool.len()
        );
        Ok(())
    }

    /// Evaluates `input` against the current question and records the result.
    pub fn submit(&mut self, input: &AnswerInput) -> Result<(Evaluation, AnswerOutcome), CoreError> {
        let question = self
            .current_question()
            .ok_or_else(|| self.invalid("answer"))?;
        let evaluation = answer_evaluator::evaluate(question, input);
        let question_id = question.id.clone();
        let outcome = self.answer(&question_id, evaluation.passes())?;
        Ok((evaluation, outcome))
    }

    /// Records an already-evaluated answer for the current question.
    pub fn answer(&mut self, question_id: &str, is_correct: bool) -> Result<AnswerOutcome, CoreError> {
        let round = match self.status {
            SessionStatus::InProgress { round } => round,
            _ => return Err(self.invalid("answer")),
        };
        let index = self.round[self.position];
        if self.pool[index].id != question_id {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str(),
                action: "answer a question that is not current",
            });
        }

        if is_correct {
            self.correct_ever.insert(question_id.to_string());
        } else {
            self.wrong_ever.insert(question_id.to_string());
            self.wrong_this_round.push(index);
        }
        self.position += 1;

        if self.position < self.round.len() {
            return Ok(AnswerOutcome::Next {
                remaining: self.round.len() - self.position,
            });
        }

        if !self.wrong_this_round.is_empty() {
            self.status = SessionStatus::RoundFailed { round };
            tracing::debug!(
                "Session {} failed round {} with {} wrong",
                self.id,
                round,
                self.wrong_this_round.len()
            );
            return Ok(AnswerOutcome::RoundFailed {
                round,
                wrong: self.wrong_this_round.len(),
            });
        }

        let reward = TaskReward::calculate(self.correct_ever.len(), self.pool.len());
        self.bell_peppers.refund();
        self.reward = Some(reward);
        self.status = SessionStatus::Completed;

        tracing::debug!(
            "Session {} completed after {} round(s): {} points",
            self.id,
            round,
            reward.points
        );
        Ok(AnswerOutcome::Completed {
            reward,
            rounds: round,
        })
    }

    /// Starts the next round with the questions missed in the failed one.
    pub fn retry(&mut self) -> Result<(), CoreError> {
        let round = match self.status {
            SessionStatus::RoundFailed { round } => round,
            _ => return Err(self.invalid("retry")),
        };
        self.bell_peppers.consume()?;

        self.round = std::mem::take(&mut self.wrong_this_round);
        self.position = 0;
        self.round_number = round + 1;
        self.status = SessionStatus::InProgress {
            round: self.round_number,
        };

        tracing::debug!(
            "Session {} retrying {} question(s) in round {}",
            self.id,
            self.round.len(),
            self.round_number
        );
        Ok(())
    }

    /// Gives up the attempt. The spent bell peppers are not returned.
    pub fn abandon(&mut self) -> Result<(), CoreError> {
        if self.status.is_finished() {
            return Err(self.invalid("abandon"));
        }
        self.status = SessionStatus::Abandoned;
        self.round.clear();
        self.wrong_this_round.clear();
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            from: self.status.as_str(),
            action,
        }
    }
}
