pub mod artifact;
pub mod generation_request;
pub mod locale;
pub mod mode;
pub use artifact::{
    Definition, Formula, NormalizedArtifact, PlanArtifact, PlanDay, PlanSlot, QuizArtifact,
    QuizQuestion, RawModelReply, SheetArtifact, SheetQuizItem, SummaryArtifact,
};
pub use generation_request::{GenerationRequest, QuestionStyle};
pub use locale::{Labels, Locale};
pub use mode::Mode;
