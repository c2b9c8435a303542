// Prompt fragments for the generation endpoint. Placeholders in braces are
// filled in by `PromptBuilder`.

pub const SYSTEM_PREAMBLE: &str = r#"You are a revision assistant.
You must answer ONLY with valid JSON.
Forbidden: no markdown, no text around the JSON, no ``` fences.
Language: {language}.
Content: based ONLY on the supplied course (or on the subject if the course is empty)."#;

pub const SHEET_SHAPE: &str = r#"Expected EXACT JSON:
{
  "title": string,
  "summary": string[],
  "key_points": string[],
  "definitions": [{"term": string, "definition": string}],
  "formulas": [{"label": string, "value": string}],
  "examples": string[],
  "common_mistakes": string[],
  "quiz": [{"question": string, "answer": string}]
}

Constraints:
- summary: 4-8 bullets
- key_points: 8-15 bullets
- definitions: 6-12
- formulas: if relevant, otherwise []
- examples: 3-6
- common_mistakes: 4-8 (each with a short correction)
- quiz: 4-8"#;

pub const SUMMARY_SHAPE: &str = r#"Expected EXACT JSON:
{
  "title": string,
  "summary": string[],
  "key_points": string[]
}

Constraints:
- summary: 6-12 bullets
- key_points: 6-12 bullets"#;

pub const PLAN_SHAPE: &str = r#"Expected EXACT JSON:
{
  "title": string,
  "overview": string,
  "days": [{"day": string, "slots": [{"time": string, "task": string}]}],
  "tips": string[]
}

Strict constraints:
- "days" contains EXACTLY {days} days
- {minutes} minutes per day
- 3 to 6 slots per day
- Subjects: {subjects}
- Goal: {goal}
- tips: at least 5

Give precise slots such as "18:00-18:20" and actionable tasks."#;

pub const QUIZ_SHAPE: &str = r#"Goal: generate a quiz based on the course, with nothing off-topic.
You must produce EXACTLY {count} questions.

Expected EXACT JSON:
{
  "title": string,
  "instructions": string,
  "questions": [
    {question_shape}
  ]
}

Strict constraints:
- "questions" contains EXACTLY {count} elements.
- {option_rule}
- Every question must come from the COURSE (otherwise from the SUBJECT if the course is empty).
- Pure JSON only."#;

pub const QUIZ_MULTIPLE_CHOICE_SHAPE: &str =
    r#"{"question": string, "options": [string, string, string, string], "answerIndex": 0|1|2|3, "explanation": string}"#;

pub const QUIZ_SHORT_ANSWER_SHAPE: &str =
    r#"{"question": string, "answer": string, "explanation": string}"#;

pub const QUIZ_MULTIPLE_CHOICE_RULE: &str = "\"options\" contains EXACTLY 4 choices.";

pub const QUIZ_SHORT_ANSWER_RULE: &str = "short answers.";

/// Shown in place of an empty subject or course.
pub const EMPTY_PLACEHOLDER: &str = "(empty)";

/// Appended to source text cut at `MAX_SOURCE_CHARS`.
pub const TRUNCATION_MARKER: &str = "\n\n[TRUNCATED]";

pub const MAX_SOURCE_CHARS: usize = 20_000;
