use std::fmt;

use serde::{Deserialize, Serialize};

/// The four kinds of study artifact the service can generate.
///
/// Wire names follow the form values the front end has always sent
/// (`resume`, `fiche`, `planning`, `quiz`); the English names are accepted
/// as aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Mode {
    #[serde(rename = "resume", alias = "summary")]
    Summary,
    #[serde(rename = "fiche", alias = "sheet")]
    Sheet,
    #[serde(rename = "planning", alias = "plan")]
    Plan,
    #[serde(rename = "quiz")]
    Quiz,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Summary, Mode::Sheet, Mode::Plan, Mode::Quiz];

    /// Top-level field whose type decides whether a parsed reply is usable.
    pub fn required_field(&self) -> &'static str {
        match self {
            Mode::Summary => "summary",
            Mode::Sheet => "key_points",
            Mode::Plan => "days",
            Mode::Quiz => "questions",
        }
    }

    /// Stem used for exported file names when the artifact has no title.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Mode::Summary => "resume",
            Mode::Sheet => "fiche",
            Mode::Plan => "planning",
            Mode::Quiz => "quiz",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Summary => write!(f, "summary"),
            Mode::Sheet => write!(f, "sheet"),
            Mode::Plan => write!(f, "plan"),
            Mode::Quiz => write!(f, "quiz"),
        }
    }
}
