use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::domain::{
    Definition, Formula, Locale, Mode, NormalizedArtifact, PlanArtifact, PlanDay, PlanSlot,
    QuizArtifact, QuizQuestion, RawModelReply, SheetArtifact, SheetQuizItem, SummaryArtifact,
};

/// Most lines kept when a reply has to be degraded.
pub const MAX_FALLBACK_LINES: usize = 30;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("CODE_FENCE is a valid regex pattern")
});

/// How placeholder questions are built when a quiz reply cannot be parsed.
///
/// The correct answer of a placeholder question is not known, so
/// `correct_index` is an arbitrary marker; the default marks the first
/// option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackQuizPolicy {
    pub max_questions: usize,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Default for FallbackQuizPolicy {
    fn default() -> Self {
        Self {
            max_questions: 10,
            options: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
            correct_index: 0,
        }
    }
}

/// The parse attempt that produced a usable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    CodeFence,
    TrailingObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no candidate region in reply")]
    NoCandidate,
    #[error("reply is not a JSON object: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Parsed(ParseStage),
    Degraded(DegradeReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    Unparseable,
    MissingField(&'static str),
    WrongFieldType(&'static str),
}

/// Turns untrusted model text into a typed artifact. Never fails: when
/// nothing parses, a minimal artifact is synthesized from the reply lines.
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    locale: Locale,
    quiz_policy: FallbackQuizPolicy,
}

impl ResponseNormalizer {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            quiz_policy: FallbackQuizPolicy::default(),
        }
    }

    pub fn with_quiz_policy(mut self, policy: FallbackQuizPolicy) -> Self {
        self.quiz_policy = policy;
        self
    }

    pub fn normalize(&self, mode: Mode, reply: &RawModelReply) -> NormalizedArtifact {
        self.normalize_with_outcome(mode, reply).0
    }

    pub fn normalize_with_outcome(
        &self,
        mode: Mode,
        reply: &RawModelReply,
    ) -> (NormalizedArtifact, NormalizeOutcome) {
        let reason = match parse_object(reply.as_str()) {
            Ok((object, stage)) => match check_shape(mode, &object) {
                Ok(()) => {
                    log::debug!("Parsed {} reply at stage {:?}", mode, stage);
                    return (build_artifact(mode, &object), NormalizeOutcome::Parsed(stage));
                }
                Err(reason) => reason,
            },
            Err(err) => {
                log::debug!("Could not parse {} reply: {}", mode, err);
                DegradeReason::Unparseable
            }
        };

        let artifact = self.degrade(mode, reply.as_str());
        log::warn!(
            "Degraded {} reply ({:?}, {} chars)",
            mode,
            reason,
            reply.as_str().len()
        );
        (artifact, NormalizeOutcome::Degraded(reason))
    }

    /// Builds a minimal artifact out of the first non-empty reply lines.
    fn degrade(&self, mode: Mode, text: &str) -> NormalizedArtifact {
        let labels = self.locale.labels();
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_FALLBACK_LINES)
            .map(str::to_string)
            .collect();

        match mode {
            Mode::Quiz => {
                let correct = if self.quiz_policy.correct_index < self.quiz_policy.options.len() {
                    self.quiz_policy.correct_index
                } else {
                    0
                };
                NormalizedArtifact::Quiz(QuizArtifact {
                    title: labels.fallback_quiz_title.to_string(),
                    instructions: None,
                    questions: lines
                        .into_iter()
                        .take(self.quiz_policy.max_questions)
                        .map(|line| QuizQuestion {
                            question: line,
                            options: self.quiz_policy.options.clone(),
                            answer_index: correct,
                            explanation: None,
                        })
                        .collect(),
                })
            }
            Mode::Summary => NormalizedArtifact::Summary(SummaryArtifact {
                title: labels.fallback_title.to_string(),
                summary: lines,
                key_points: Vec::new(),
            }),
            Mode::Sheet => NormalizedArtifact::Sheet(SheetArtifact {
                title: labels.fallback_title.to_string(),
                summary: lines,
                ..SheetArtifact::default()
            }),
            // A plan has no bullet list of its own; the lines become the overview.
            Mode::Plan => NormalizedArtifact::Plan(PlanArtifact {
                title: labels.fallback_title.to_string(),
                overview: lines.join("\n"),
                ..PlanArtifact::default()
            }),
        }
    }
}

type Stage = fn(&str) -> Result<Value, ParseError>;

/// Ordered parse attempts; the first one yielding a JSON object wins.
fn parse_object(text: &str) -> Result<(Map<String, Value>, ParseStage), ParseError> {
    let stages: [(ParseStage, Stage); 3] = [
        (ParseStage::Strict, parse_strict),
        (ParseStage::CodeFence, parse_code_fence),
        (ParseStage::TrailingObject, parse_trailing_object),
    ];

    let mut last_error = ParseError::NoCandidate;
    for (stage, attempt) in stages {
        match attempt(text) {
            Ok(Value::Object(object)) => return Ok((object, stage)),
            Ok(other) => {
                last_error = ParseError::Invalid(format!("top-level value is {}", kind_of(&other)))
            }
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

fn parse_strict(text: &str) -> Result<Value, ParseError> {
    serde_json::from_str(text.trim()).map_err(|e| ParseError::Invalid(e.to_string()))
}

fn parse_code_fence(text: &str) -> Result<Value, ParseError> {
    let inner = CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::NoCandidate)?;
    parse_strict(inner.as_str())
}

/// Parses the last top-level `{...}` region: the object closed by the final
/// `}` in the reply, whatever prose precedes or follows it.
fn parse_trailing_object(text: &str) -> Result<Value, ParseError> {
    let end = text.rfind('}').ok_or(ParseError::NoCandidate)?;
    let region = &text[..=end];

    let mut last_error = ParseError::NoCandidate;
    for (start, _) in region.rmatch_indices('{') {
        match serde_json::from_str::<Value>(&region[start..]) {
            Ok(value @ Value::Object(_)) => return Ok(value),
            Ok(_) => {}
            Err(e) => last_error = ParseError::Invalid(e.to_string()),
        }
    }
    Err(last_error)
}

fn check_shape(mode: Mode, object: &Map<String, Value>) -> Result<(), DegradeReason> {
    let field = mode.required_field();
    match object.get(field) {
        Some(Value::Array(_)) => Ok(()),
        // Plans written in the older `schedule` layout have no `days`.
        None | Some(Value::Null) if mode != Mode::Quiz => Ok(()),
        None | Some(Value::Null) => Err(DegradeReason::MissingField(field)),
        Some(_) => Err(DegradeReason::WrongFieldType(field)),
    }
}

fn build_artifact(mode: Mode, object: &Map<String, Value>) -> NormalizedArtifact {
    match mode {
        Mode::Summary => NormalizedArtifact::Summary(SummaryArtifact {
            title: text_field(object, &["title"]),
            summary: text_list(object.get("summary")),
            key_points: text_list(object.get("key_points")),
        }),
        Mode::Sheet => NormalizedArtifact::Sheet(SheetArtifact {
            title: text_field(object, &["title"]),
            summary: text_list(object.get("summary")),
            key_points: text_list(object.get("key_points")),
            definitions: items(object.get("definitions"))
                .filter_map(definition)
                .collect(),
            formulas: items(object.get("formulas")).filter_map(formula).collect(),
            examples: text_list(object.get("examples")),
            common_mistakes: text_list(object.get("common_mistakes")),
            quiz: items(object.get("quiz")).filter_map(sheet_quiz_item).collect(),
        }),
        Mode::Plan => NormalizedArtifact::Plan(PlanArtifact {
            title: text_field(object, &["title"]),
            overview: text_field(object, &["overview"]),
            days: plan_days(object),
            tips: text_list(object.get("tips")),
        }),
        Mode::Quiz => NormalizedArtifact::Quiz(QuizArtifact {
            title: text_field(object, &["title"]),
            instructions: Some(text_field(object, &["instructions"])).filter(|s| !s.is_empty()),
            questions: items(object.get("questions"))
                .filter_map(quiz_question)
                .collect(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(values) => values
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// First present key among `keys`, as text.
fn text_field(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()))
        .map(value_to_text)
        .unwrap_or_default()
}

fn items(value: Option<&Value>) -> std::slice::Iter<'_, Value> {
    match value {
        Some(Value::Array(values)) => values.iter(),
        _ => std::slice::Iter::default(),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn split_pair(text: &str, separator: char) -> (String, String) {
    match text.split_once(separator) {
        Some((left, right)) => (left.trim().to_string(), right.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

fn definition(value: &Value) -> Option<Definition> {
    let (term, definition) = match value {
        Value::Object(o) => (
            text_field(o, &["term", "name"]),
            text_field(o, &["definition", "meaning", "description"]),
        ),
        Value::String(s) => split_pair(s, ':'),
        _ => return None,
    };
    (!term.is_empty() || !definition.is_empty()).then_some(Definition { term, definition })
}

fn formula(value: &Value) -> Option<Formula> {
    let (label, value) = match value {
        Value::Object(o) => (
            text_field(o, &["label", "name"]),
            text_field(o, &["value", "formula", "expression"]),
        ),
        Value::String(s) => split_pair(s, '='),
        _ => return None,
    };
    (!label.is_empty() || !value.is_empty()).then_some(Formula { label, value })
}

fn sheet_quiz_item(value: &Value) -> Option<SheetQuizItem> {
    let item = match value {
        Value::Object(o) => SheetQuizItem {
            question: text_field(o, &["question"]),
            answer: text_field(o, &["answer", "response"]),
        },
        Value::String(s) if !s.trim().is_empty() => SheetQuizItem {
            question: s.trim().to_string(),
            answer: String::new(),
        },
        _ => return None,
    };
    (!item.question.is_empty()).then_some(item)
}

fn plan_slot(value: &Value) -> Option<PlanSlot> {
    match value {
        Value::Object(o) => Some(PlanSlot {
            time: text_field(o, &["time", "slot"]),
            task: text_field(o, &["task", "activity"]),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(PlanSlot {
            time: String::new(),
            task: s.trim().to_string(),
        }),
        _ => None,
    }
}

fn plan_days(object: &Map<String, Value>) -> Vec<PlanDay> {
    if let Some(Value::Array(days)) = object.get("days") {
        return days
            .iter()
            .filter_map(|day| match day {
                Value::Object(o) => Some(PlanDay {
                    day: text_field(o, &["day", "label", "title"]),
                    slots: items(o.get("slots")).filter_map(plan_slot).collect(),
                }),
                _ => None,
            })
            .collect();
    }

    // older layout: {"schedule": [{"tasks": [..]}]}
    items(object.get("schedule"))
        .filter_map(|entry| match entry {
            Value::Object(o) => Some(PlanDay {
                day: String::new(),
                slots: items(o.get("tasks")).filter_map(plan_slot).collect(),
            }),
            _ => None,
        })
        .collect()
}

/// Reads an answer marker: an index, a numeric string, or an option letter.
fn index_from(value: &Value, option_count: usize) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<usize>() {
                return Some(i);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_alphabetic() => {
                    let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
                    (index < option_count.max(1)).then_some(index)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn quiz_question(value: &Value) -> Option<QuizQuestion> {
    let object = match value {
        Value::Object(o) => o,
        Value::String(s) if !s.trim().is_empty() => {
            return Some(QuizQuestion {
                question: s.trim().to_string(),
                ..QuizQuestion::default()
            })
        }
        _ => return None,
    };

    let question = text_field(object, &["question", "prompt"]);
    let mut options = text_list(object.get("options").or_else(|| object.get("choices")));
    let explanation = Some(text_field(object, &["explanation"])).filter(|e| !e.is_empty());

    let answer_text = text_field(object, &["answer"]);
    let short_answer = options.is_empty() && !answer_text.is_empty();
    if short_answer {
        // short-answer question: the answer is the single option
        options.push(answer_text.clone());
    }

    let explicit = ["answerIndex", "answer_index", "correctIndex", "correct_index"]
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(|v| index_from(v, options.len()));

    let answer_index = match explicit {
        Some(index) => index,
        None if short_answer => 0,
        None => options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(&answer_text))
            .or_else(|| {
                object
                    .get("answer")
                    .and_then(|v| index_from(v, options.len()))
            })
            .unwrap_or(0),
    };

    if question.is_empty() && options.is_empty() {
        return None;
    }

    let answer_index = if answer_index < options.len() { answer_index } else { 0 };

    Some(QuizQuestion {
        question,
        options,
        answer_index,
        explanation,
    })
}
