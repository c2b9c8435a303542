use serde::{Deserialize, Serialize};

use crate::models::{domain::Mode, dto::request::GenerationPayload};

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const MIN_QUESTION_COUNT: u32 = 1;
pub const MAX_QUESTION_COUNT: u32 = 30;

pub const DEFAULT_PLAN_DAYS: u32 = 5;
pub const MIN_PLAN_DAYS: u32 = 1;
pub const MAX_PLAN_DAYS: u32 = 60;

pub const DEFAULT_MINUTES_PER_DAY: u32 = 60;
pub const MIN_MINUTES_PER_DAY: u32 = 10;
pub const MAX_MINUTES_PER_DAY: u32 = 600;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStyle {
    #[default]
    MultipleChoice,
    ShortAnswer,
}

impl QuestionStyle {
    /// Reads the free-form `type` field of the form. Anything that does not
    /// explicitly ask for open answers is treated as multiple choice.
    pub fn from_label(label: Option<&str>) -> Self {
        let label = label.unwrap_or_default().to_lowercase();
        let short = ["short", "open", "courte", "libre"];
        if short.iter().any(|s| label.contains(s)) {
            QuestionStyle::ShortAnswer
        } else {
            QuestionStyle::MultipleChoice
        }
    }
}

/// A validated, mode-specific generation request. Built fresh for every
/// user action and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GenerationRequest {
    Summary {
        source_text: String,
    },
    Sheet {
        subject: String,
        source_text: String,
    },
    Plan {
        subjects: String,
        days: u32,
        minutes_per_day: u32,
        goal: String,
    },
    Quiz {
        subject: String,
        source_text: String,
        question_count: u32,
        style: QuestionStyle,
    },
}

fn clamp_or(value: Option<i64>, default: u32, min: u32, max: u32) -> u32 {
    match value {
        Some(v) => v.clamp(i64::from(min), i64::from(max)) as u32,
        None => default,
    }
}

fn text_or_empty(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

impl GenerationRequest {
    /// Builds the typed request for `mode` out of the loose form payload.
    /// Numeric parameters are clamped into range rather than rejected.
    pub fn from_payload(mode: Mode, payload: &GenerationPayload) -> Self {
        let subject = text_or_empty(&payload.subject);
        let text = text_or_empty(&payload.text);
        let text_or_subject = if text.is_empty() {
            subject.clone()
        } else {
            text.clone()
        };

        match mode {
            Mode::Summary => GenerationRequest::Summary {
                source_text: text_or_subject,
            },
            Mode::Sheet => GenerationRequest::Sheet {
                subject,
                source_text: text,
            },
            Mode::Plan => GenerationRequest::Plan {
                subjects: text_or_empty(&payload.subjects),
                days: clamp_or(payload.days, DEFAULT_PLAN_DAYS, MIN_PLAN_DAYS, MAX_PLAN_DAYS),
                minutes_per_day: clamp_or(
                    payload.minutes,
                    DEFAULT_MINUTES_PER_DAY,
                    MIN_MINUTES_PER_DAY,
                    MAX_MINUTES_PER_DAY,
                ),
                goal: text_or_empty(&payload.goal),
            },
            Mode::Quiz => GenerationRequest::Quiz {
                subject,
                source_text: text_or_subject,
                question_count: clamp_or(
                    payload.num_questions,
                    DEFAULT_QUESTION_COUNT,
                    MIN_QUESTION_COUNT,
                    MAX_QUESTION_COUNT,
                ),
                style: QuestionStyle::from_label(payload.question_type.as_deref()),
            },
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            GenerationRequest::Summary { .. } => Mode::Summary,
            GenerationRequest::Sheet { .. } => Mode::Sheet,
            GenerationRequest::Plan { .. } => Mode::Plan,
            GenerationRequest::Quiz { .. } => Mode::Quiz,
        }
    }

    /// Number of questions the quiz prompt demands, if this is a quiz.
    pub fn question_count(&self) -> Option<u32> {
        match self {
            GenerationRequest::Quiz { question_count, .. } => Some(*question_count),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> GenerationPayload {
        GenerationPayload::default()
    }

    #[test]
    fn quiz_count_is_clamped_into_range() {
        let high = GenerationPayload {
            num_questions: Some(99),
            ..payload()
        };
        let low = GenerationPayload {
            num_questions: Some(-4),
            ..payload()
        };

        assert_eq!(
            GenerationRequest::from_payload(Mode::Quiz, &high).question_count(),
            Some(30)
        );
        assert_eq!(
            GenerationRequest::from_payload(Mode::Quiz, &low).question_count(),
            Some(1)
        );
        assert_eq!(
            GenerationRequest::from_payload(Mode::Quiz, &payload()).question_count(),
            Some(DEFAULT_QUESTION_COUNT)
        );
    }

    #[test]
    fn plan_defaults_and_clamps() {
        let request = GenerationRequest::from_payload(
            Mode::Plan,
            &GenerationPayload {
                minutes: Some(5000),
                ..payload()
            },
        );

        assert_eq!(
            request,
            GenerationRequest::Plan {
                subjects: String::new(),
                days: DEFAULT_PLAN_DAYS,
                minutes_per_day: MAX_MINUTES_PER_DAY,
                goal: String::new(),
            }
        );
    }

    #[test]
    fn summary_falls_back_to_subject_when_text_is_empty() {
        let request = GenerationRequest::from_payload(
            Mode::Summary,
            &GenerationPayload {
                subject: Some("Photosynthesis".to_string()),
                text: Some("   ".to_string()),
                ..payload()
            },
        );

        assert_eq!(
            request,
            GenerationRequest::Summary {
                source_text: "Photosynthesis".to_string()
            }
        );
    }

    #[test]
    fn question_style_defaults_to_multiple_choice() {
        assert_eq!(QuestionStyle::from_label(None), QuestionStyle::MultipleChoice);
        assert_eq!(
            QuestionStyle::from_label(Some("QCM (4 choix)")),
            QuestionStyle::MultipleChoice
        );
        assert_eq!(
            QuestionStyle::from_label(Some("Short answer")),
            QuestionStyle::ShortAnswer
        );
    }

    #[test]
    fn mode_matches_variant() {
        for mode in Mode::ALL {
            assert_eq!(GenerationRequest::from_payload(mode, &payload()).mode(), mode);
        }
    }
}
