//! Correctness predicates for every question type.
//!
//! Each check looks only at the question payload and the user's input. An
//! input of the wrong shape for the question (a boolean for a multiple-choice
//! question, an option index past the end) evaluates as incorrect.

use std::collections::BTreeSet;

use crate::metrics::ANSWERS_EVALUATED_TOTAL;
use crate::models::question::{ChoiceOption, Question, QuestionPayload};
use crate::models::session::{AnswerInput, Evaluation};

pub fn evaluate(question: &Question, input: &AnswerInput) -> Evaluation {
    let evaluation = match (&question.payload, input) {
        (QuestionPayload::MultipleChoice { options }, AnswerInput::Choice(index)) => {
            from_bool(is_correct_choice(options, *index))
        }
        (QuestionPayload::TrueFalse { correct }, AnswerInput::Boolean(selected)) => {
            from_bool(selected == correct)
        }
        (QuestionPayload::BugReport { correct_text, .. }, AnswerInput::Text(text)) => {
            from_bool(matches_ignoring_whitespace(text, correct_text))
        }
        (QuestionPayload::PressMistakes { mistakes, .. }, AnswerInput::Positions(selected)) => {
            from_bool(is_exact_mistake_set(selected, mistakes))
        }
        (QuestionPayload::OpenEnded { correct_answer }, AnswerInput::Text(text)) => {
            from_bool(matches_case_insensitive(text, correct_answer))
        }
        (QuestionPayload::FlipCard { .. }, _) => Evaluation::Unscored,
        _ => {
            tracing::debug!(
                "Input {:?} does not fit {} question {}",
                input,
                question.kind().as_str(),
                question.id
            );
            Evaluation::Incorrect
        }
    };

    ANSWERS_EVALUATED_TOTAL
        .with_label_values(&[question.kind().as_str(), evaluation.as_str()])
        .inc();

    evaluation
}

fn from_bool(correct: bool) -> Evaluation {
    if correct {
        Evaluation::Correct
    } else {
        Evaluation::Incorrect
    }
}

/// Correctness belongs to the option itself, not to its text.
pub fn is_correct_choice(options: &[ChoiceOption], index: usize) -> bool {
    options.get(index).is_some_and(|option| option.is_correct)
}

pub fn matches_ignoring_whitespace(input: &str, expected: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    strip(input) == strip(expected)
}

/// Exact set equality; a superset or subset of the mistakes fails.
pub fn is_exact_mistake_set(selected: &BTreeSet<usize>, mistakes: &BTreeSet<usize>) -> bool {
    selected == mistakes
}

pub fn matches_case_insensitive(input: &str, expected: &str) -> bool {
    input.to_lowercase() == expected.to_lowercase()
}
