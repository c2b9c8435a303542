use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::domain::{locale::Locale, mode::Mode};

/// Untrusted reply text exactly as the model returned it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawModelReply(String);

impl RawModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RawModelReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryArtifact {
    pub title: String,
    pub summary: Vec<String>,
    pub key_points: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Definition {
    pub term: String,
    pub definition: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Formula {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SheetQuizItem {
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SheetArtifact {
    pub title: String,
    pub summary: Vec<String>,
    pub key_points: Vec<String>,
    pub definitions: Vec<Definition>,
    pub formulas: Vec<Formula>,
    pub examples: Vec<String>,
    pub common_mistakes: Vec<String>,
    pub quiz: Vec<SheetQuizItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlanSlot {
    pub time: String,
    pub task: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlanDay {
    pub day: String,
    pub slots: Vec<PlanSlot>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlanArtifact {
    pub title: String,
    pub overview: String,
    pub days: Vec<PlanDay>,
    pub tips: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "answerIndex")]
    pub answer_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Letter shown next to an option in printed material (`A`, `B`, ...).
    pub fn option_letter(index: usize) -> char {
        u8::try_from(index)
            .ok()
            .and_then(|i| b'A'.checked_add(i))
            .map(char::from)
            .unwrap_or('?')
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizArtifact {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub questions: Vec<QuizQuestion>,
}

impl QuizArtifact {
    /// Projects the quiz onto a sheet so it can be printed through the sheet
    /// layout: every question becomes a key point, and every question with
    /// its lettered options and marked answer becomes an example entry.
    pub fn review_sheet(&self, locale: Locale) -> SheetArtifact {
        let labels = locale.labels();
        let base = if self.title.trim().is_empty() {
            labels.quiz_title
        } else {
            self.title.as_str()
        };

        let key_points = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("Q{}. {}", i + 1, q.question))
            .collect();

        let examples = self
            .questions
            .iter()
            .map(|q| {
                let options = q
                    .options
                    .iter()
                    .enumerate()
                    .map(|(idx, o)| format!("{}. {}", QuizQuestion::option_letter(idx), o))
                    .collect::<Vec<_>>()
                    .join(" | ");
                let mut entry = format!(
                    "{}\n{}\n{}: {}",
                    q.question,
                    options,
                    labels.answer,
                    QuizQuestion::option_letter(q.answer_index)
                );
                if let Some(explanation) = q.explanation.as_deref().filter(|e| !e.is_empty()) {
                    entry.push_str(" — ");
                    entry.push_str(explanation);
                }
                entry
            })
            .collect();

        SheetArtifact {
            title: format!("{} {}", base, labels.export_suffix),
            key_points,
            examples,
            ..SheetArtifact::default()
        }
    }
}

/// A normalized generation result, one variant per [`Mode`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NormalizedArtifact {
    Summary(SummaryArtifact),
    Sheet(SheetArtifact),
    Plan(PlanArtifact),
    Quiz(QuizArtifact),
}

impl NormalizedArtifact {
    pub fn mode(&self) -> Mode {
        match self {
            NormalizedArtifact::Summary(_) => Mode::Summary,
            NormalizedArtifact::Sheet(_) => Mode::Sheet,
            NormalizedArtifact::Plan(_) => Mode::Plan,
            NormalizedArtifact::Quiz(_) => Mode::Quiz,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NormalizedArtifact::Summary(a) => &a.title,
            NormalizedArtifact::Sheet(a) => &a.title,
            NormalizedArtifact::Plan(a) => &a.title,
            NormalizedArtifact::Quiz(a) => &a.title,
        }
    }

    pub fn as_quiz(&self) -> Option<&QuizArtifact> {
        match self {
            NormalizedArtifact::Quiz(quiz) => Some(quiz),
            _ => None,
        }
    }

    /// File name for the exported document: the title with path-hostile
    /// characters removed, or the mode's default stem.
    pub fn export_file_name(&self) -> String {
        let cleaned: String = self
            .title()
            .chars()
            .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
            .filter(|c| !c.is_control())
            .collect();
        let stem = cleaned.trim();

        if stem.is_empty() {
            format!("{}.pdf", self.mode().file_stem())
        } else {
            format!("{}.pdf", stem)
        }
    }
}
