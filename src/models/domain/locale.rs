use serde::{Deserialize, Serialize};

/// Output language for prompts, fallback titles and document labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[serde(alias = "en")]
    English,
    #[default]
    #[serde(alias = "fr")]
    French,
}

/// Fixed strings used when rendering an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub summary: &'static str,
    pub key_points: &'static str,
    pub definitions: &'static str,
    pub formulas: &'static str,
    pub examples: &'static str,
    pub quiz: &'static str,
    pub overview: &'static str,
    pub tips: &'static str,
    pub day: &'static str,
    pub answer: &'static str,
    pub export_suffix: &'static str,
    pub summary_title: &'static str,
    pub sheet_title: &'static str,
    pub plan_title: &'static str,
    pub quiz_title: &'static str,
    pub fallback_title: &'static str,
    pub fallback_quiz_title: &'static str,
}

const ENGLISH: Labels = Labels {
    summary: "Summary",
    key_points: "Key points",
    definitions: "Definitions",
    formulas: "Formulas",
    examples: "Examples",
    quiz: "Quiz",
    overview: "Overview",
    tips: "Tips",
    day: "Day",
    answer: "Answer",
    export_suffix: "(export)",
    summary_title: "Summary",
    sheet_title: "Revision sheet",
    plan_title: "Study plan",
    quiz_title: "Quiz",
    fallback_title: "AI result",
    fallback_quiz_title: "AI quiz (fallback)",
};

const FRENCH: Labels = Labels {
    summary: "Résumé",
    key_points: "Points clés",
    definitions: "Définitions",
    formulas: "Formules",
    examples: "Exemples",
    quiz: "Quiz",
    overview: "Aperçu",
    tips: "Conseils",
    day: "Jour",
    answer: "Réponse",
    export_suffix: "(export)",
    summary_title: "Résumé",
    sheet_title: "Fiche de révision",
    plan_title: "Planning",
    quiz_title: "Quiz",
    fallback_title: "Résultat IA",
    fallback_quiz_title: "Quiz IA (fallback)",
};

impl Locale {
    /// Parses the short codes accepted in configuration.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Locale::English),
            "fr" | "french" | "français" => Some(Locale::French),
            _ => None,
        }
    }

    /// Language named in the prompt preamble.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::English => "English",
            Locale::French => "French",
        }
    }

    pub fn labels(&self) -> &'static Labels {
        match self {
            Locale::English => &ENGLISH,
            Locale::French => &FRENCH,
        }
    }
}
