use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use validator::Validate;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    FlipCard,
    BugReport,
    PressMistakes,
    OpenEnded,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::FlipCard => "flip_card",
            QuestionKind::BugReport => "bug_report",
            QuestionKind::PressMistakes => "press_mistakes",
            QuestionKind::OpenEnded => "open_ended",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "multiplechoice" => Ok(QuestionKind::MultipleChoice),
            "truefalse" => Ok(QuestionKind::TrueFalse),
            "flipcard" => Ok(QuestionKind::FlipCard),
            "bugreport" | "edittext" => Ok(QuestionKind::BugReport),
            "pressmistakes" => Ok(QuestionKind::PressMistakes),
            "openended" => Ok(QuestionKind::OpenEnded),
            _ => Err(format!("Invalid question type: {}", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub is_correct: bool,
}

/// Type-specific content of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionPayload {
    MultipleChoice { options: Vec<ChoiceOption> },
    TrueFalse { correct: bool },
    FlipCard { front: String, back: String },
    BugReport { code: String, correct_text: String },
    PressMistakes { words: Vec<String>, mistakes: BTreeSet<usize> },
    OpenEnded { correct_answer: String },
}

impl QuestionPayload {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionPayload::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionPayload::TrueFalse { .. } => QuestionKind::TrueFalse,
            QuestionPayload::FlipCard { .. } => QuestionKind::FlipCard,
            QuestionPayload::BugReport { .. } => QuestionKind::BugReport,
            QuestionPayload::PressMistakes { .. } => QuestionKind::PressMistakes,
            QuestionPayload::OpenEnded { .. } => QuestionKind::OpenEnded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub payload: QuestionPayload,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.payload.kind()
    }
}

/// Row of the remote `questions` table. Every type shares one wide row, so
/// which optional columns are required depends on `question_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct QuestionRecord {
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub id: String,
    pub task_id: String,
    #[validate(length(min = 1, message = "question_type must not be empty"))]
    pub question_type: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default)]
    pub correct_bool: Option<bool>,
    #[serde(default)]
    pub correct_text: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<String>>,
    #[serde(default)]
    pub mistakes: Option<Vec<usize>>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = CoreError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        record
            .validate()
            .map_err(|e| CoreError::malformed(record.id.clone(), e.to_string()))?;

        let id = record.id;
        let kind = QuestionKind::from_str(&record.question_type)
            .map_err(|reason| CoreError::malformed(id.clone(), reason))?;
        let missing = |field: &str| {
            CoreError::malformed(
                id.clone(),
                format!("{} requires `{}`", kind.as_str(), field),
            )
        };

        let payload = match kind {
            QuestionKind::MultipleChoice => {
                let options = record.options.ok_or_else(|| missing("options"))?;
                if options.is_empty() {
                    return Err(missing("options"));
                }
                if !options.iter().any(|o| o.is_correct) {
                    return Err(CoreError::malformed(
                        id.clone(),
                        "multiple_choice has no correct option",
                    ));
                }
                QuestionPayload::MultipleChoice { options }
            }
            QuestionKind::TrueFalse => QuestionPayload::TrueFalse {
                correct: record.correct_bool.ok_or_else(|| missing("correct_bool"))?,
            },
            QuestionKind::FlipCard => QuestionPayload::FlipCard {
                front: record.front.ok_or_else(|| missing("front"))?,
                back: record.back.ok_or_else(|| missing("back"))?,
            },
            QuestionKind::BugReport => QuestionPayload::BugReport {
                code: record.code.unwrap_or_default(),
                correct_text: record.correct_text.ok_or_else(|| missing("correct_text"))?,
            },
            QuestionKind::PressMistakes => {
                let words = record.words.ok_or_else(|| missing("words"))?;
                let mistakes: BTreeSet<usize> = record
                    .mistakes
                    .ok_or_else(|| missing("mistakes"))?
                    .into_iter()
                    .collect();
                if let Some(out_of_range) = mistakes.iter().find(|&&i| i >= words.len()) {
                    return Err(CoreError::malformed(
                        id.clone(),
                        format!(
                            "mistake index {} outside {} words",
                            out_of_range,
                            words.len()
                        ),
                    ));
                }
                QuestionPayload::PressMistakes { words, mistakes }
            }
            QuestionKind::OpenEnded => QuestionPayload::OpenEnded {
                correct_answer: record.correct_text.ok_or_else(|| missing("correct_text"))?,
            },
        };

        Ok(Question {
            id,
            prompt: record.prompt,
            payload,
        })
    }
}
