use crate::{
    constants::prompts::{
        EMPTY_PLACEHOLDER, MAX_SOURCE_CHARS, PLAN_SHAPE, QUIZ_MULTIPLE_CHOICE_RULE,
        QUIZ_MULTIPLE_CHOICE_SHAPE, QUIZ_SHAPE, QUIZ_SHORT_ANSWER_RULE, QUIZ_SHORT_ANSWER_SHAPE,
        SHEET_SHAPE, SUMMARY_SHAPE, SYSTEM_PREAMBLE, TRUNCATION_MARKER,
    },
    models::domain::{GenerationRequest, Locale, QuestionStyle},
};

/// Builds the instruction text sent to the model. Pure and deterministic:
/// the same request and locale always yield the same prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    locale: Locale,
}

impl PromptBuilder {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn build(&self, request: &GenerationRequest) -> String {
        let preamble = fill(SYSTEM_PREAMBLE, &[("language", self.locale.language_name())]);

        let body = match request {
            GenerationRequest::Summary { source_text } => format!(
                "{}\n\nCOURSE:\n{}",
                SUMMARY_SHAPE,
                or_placeholder(&clip_text(source_text))
            ),
            GenerationRequest::Sheet {
                subject,
                source_text,
            } => format!(
                "{}\n\nSUBJECT: {}\n\nCOURSE:\n{}",
                SHEET_SHAPE,
                or_placeholder(subject),
                or_placeholder(&clip_text(source_text))
            ),
            GenerationRequest::Plan {
                subjects,
                days,
                minutes_per_day,
                goal,
            } => fill(
                PLAN_SHAPE,
                &[
                    ("days", &days.to_string()),
                    ("minutes", &minutes_per_day.to_string()),
                    ("subjects", &or_placeholder(subjects)),
                    ("goal", &or_placeholder(goal)),
                ],
            ),
            GenerationRequest::Quiz {
                subject,
                source_text,
                question_count,
                style,
            } => {
                let (shape, rule) = match style {
                    QuestionStyle::MultipleChoice => {
                        (QUIZ_MULTIPLE_CHOICE_SHAPE, QUIZ_MULTIPLE_CHOICE_RULE)
                    }
                    QuestionStyle::ShortAnswer => (QUIZ_SHORT_ANSWER_SHAPE, QUIZ_SHORT_ANSWER_RULE),
                };
                let instructions = fill(
                    QUIZ_SHAPE,
                    &[
                        ("count", &question_count.to_string()),
                        ("question_shape", shape),
                        ("option_rule", rule),
                    ],
                );
                format!(
                    "{}\n\nSUBJECT: {}\n\nCOURSE:\n{}",
                    instructions,
                    or_placeholder(subject),
                    or_placeholder(&clip_text(source_text))
                )
            }
        };

        let prompt = format!("{}\n\n{}\n", preamble, body);
        log::debug!(
            "Built {} prompt ({} chars)",
            request.mode(),
            prompt.chars().count()
        );
        prompt
    }
}

/// Cuts source text to `MAX_SOURCE_CHARS` characters and marks the cut.
pub fn clip_text(text: &str) -> String {
    match text.char_indices().nth(MAX_SOURCE_CHARS) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

/// Single-pass `{name}` substitution. Values are inserted verbatim and never
/// rescanned, so user text containing braces is left alone.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
