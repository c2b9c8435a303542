use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::domain::Mode;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerateRequestDto {
    pub mode: Mode,
    #[serde(default)]
    #[validate(nested)]
    pub payload: GenerationPayload,
}

/// Mode-agnostic bag of form values. Which fields matter depends on the
/// mode; see `GenerationRequest::from_payload`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
pub struct GenerationPayload {
    #[validate(length(max = 500))]
    pub subject: Option<String>,

    pub text: Option<String>,

    #[validate(length(max = 1000))]
    pub subjects: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub days: Option<i64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub minutes: Option<i64>,

    #[validate(length(max = 1000))]
    pub goal: Option<String>,

    #[serde(
        rename = "numQuestions",
        alias = "count",
        alias = "num_questions",
        default,
        deserialize_with = "lenient_number"
    )]
    pub num_questions: Option<i64>,

    #[serde(rename = "type")]
    #[validate(length(max = 50))]
    pub question_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Form numbers arrive as numbers or numeric strings. Fractions are
/// truncated; anything unreadable counts as absent and falls back to the
/// mode default when the request is built.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        LooseNumber::Integer(n) => Some(n),
        LooseNumber::Float(f) => truncate(f),
        LooseNumber::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        LooseNumber::Other(_) => None,
    }))
}

fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

/// Body of `POST /api/normalize` and `POST /api/export`: a raw model reply
/// together with the mode it was generated for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplyRequestDto {
    pub mode: Mode,
    pub text: String,
}
