use serde::Serialize;
use thiserror::Error;

use crate::models::domain::QuizArtifact;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("question {index} does not exist (quiz has {count})")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("option {option} does not exist for question {question} ({count} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        count: usize,
    },

    #[error("answers are locked until the quiz is retaken")]
    AlreadySubmitted,

    #[error("quiz has no questions")]
    NoQuestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Unanswered,
    Answering,
    Submitted,
}

/// Per-question feedback, available once the quiz is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    pub chosen: Option<usize>,
    pub correct: usize,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub reviews: Vec<QuestionReview>,
}

/// Interactive answering of one generated quiz.
///
/// `selections` always has one slot per question; `None` is the
/// unanswered marker. Every transition takes `&mut self`, so selections
/// and the submitted flag are never observed half-updated.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSession {
    artifact: QuizArtifact,
    selections: Vec<Option<usize>>,
    submitted: bool,
}

impl QuizSession {
    pub fn new(artifact: QuizArtifact) -> Self {
        let selections = vec![None; artifact.questions.len()];
        Self {
            artifact,
            selections,
            submitted: false,
        }
    }

    pub fn artifact(&self) -> &QuizArtifact {
        &self.artifact
    }

    pub fn selections(&self) -> &[Option<usize>] {
        &self.selections
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn state(&self) -> QuizState {
        if self.submitted {
            QuizState::Submitted
        } else if self.selections.iter().any(Option::is_some) {
            QuizState::Answering
        } else {
            QuizState::Unanswered
        }
    }

    /// Records `option_index` as the answer to `question_index`, replacing
    /// any earlier choice.
    pub fn select_option(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }

        let question = self.artifact.questions.get(question_index).ok_or(
            QuizError::QuestionOutOfRange {
                index: question_index,
                count: self.artifact.questions.len(),
            },
        )?;

        if option_index >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                question: question_index,
                option: option_index,
                count: question.options.len(),
            });
        }

        self.selections[question_index] = Some(option_index);
        Ok(())
    }

    /// Locks the answers. Submitting twice is harmless.
    pub fn submit(&mut self) -> Result<QuizResult, QuizError> {
        if self.artifact.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        self.submitted = true;
        Ok(self.result())
    }

    /// Number of questions whose selection matches the answer index.
    /// Recomputed on every call.
    pub fn score(&self) -> usize {
        self.artifact
            .questions
            .iter()
            .zip(&self.selections)
            .filter(|(q, chosen)| **chosen == Some(q.answer_index))
            .count()
    }

    pub fn total(&self) -> usize {
        self.artifact.questions.len()
    }

    /// Answer feedback for one question; `None` before submission.
    pub fn review(&self, question_index: usize) -> Option<QuestionReview> {
        if !self.submitted {
            return None;
        }
        let question = self.artifact.questions.get(question_index)?;
        let chosen = self.selections[question_index];
        Some(QuestionReview {
            chosen,
            correct: question.answer_index,
            is_correct: chosen == Some(question.answer_index),
            explanation: question.explanation.clone(),
        })
    }

    pub fn result(&self) -> QuizResult {
        QuizResult {
            score: self.score(),
            total: self.total(),
            reviews: (0..self.total()).filter_map(|i| self.review(i)).collect(),
        }
    }

    /// Clears every answer and unlocks the quiz. The questions stay as they are.
    pub fn retake(&mut self) {
        self.selections = vec![None; self.artifact.questions.len()];
        self.submitted = false;
    }
}
