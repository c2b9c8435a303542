#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{
        Definition, Formula, PlanArtifact, PlanDay, PlanSlot, QuizArtifact, QuizQuestion,
        SheetArtifact, SheetQuizItem, SummaryArtifact,
    };

    /// A multiple-choice quiz of `count` questions whose answer is always
    /// the second option.
    pub fn sample_quiz(count: usize) -> QuizArtifact {
        QuizArtifact {
            title: "Sample quiz".to_string(),
            instructions: Some("Pick one answer per question.".to_string()),
            questions: (1..=count)
                .map(|i| QuizQuestion {
                    question: format!("Question {}?", i),
                    options: (1..=4).map(|o| format!("Option {}", o)).collect(),
                    answer_index: 1,
                    explanation: Some(format!("Because {}.", i)),
                })
                .collect(),
        }
    }

    pub fn sample_summary() -> SummaryArtifact {
        SummaryArtifact {
            title: "Cell biology".to_string(),
            summary: vec![
                "Cells are the basic unit of life.".to_string(),
                "Mitochondria produce ATP.".to_string(),
            ],
            key_points: vec!["Cell theory".to_string(), "Organelles".to_string()],
        }
    }

    pub fn sample_sheet() -> SheetArtifact {
        SheetArtifact {
            title: "Thermodynamics".to_string(),
            summary: vec!["Energy is conserved.".to_string()],
            key_points: vec![
                "First law".to_string(),
                "Second law".to_string(),
                "Entropy increases".to_string(),
            ],
            definitions: vec![Definition {
                term: "Entropy".to_string(),
                definition: "Measure of disorder".to_string(),
            }],
            formulas: vec![Formula {
                label: "Work".to_string(),
                value: "W = P dV".to_string(),
            }],
            examples: vec!["A piston compressing gas.".to_string()],
            common_mistakes: vec!["Confusing heat and temperature.".to_string()],
            quiz: vec![SheetQuizItem {
                question: "What is conserved?".to_string(),
                answer: "Energy".to_string(),
            }],
        }
    }

    pub fn sample_plan() -> PlanArtifact {
        PlanArtifact {
            title: "Exam week".to_string(),
            overview: "Three focused days.".to_string(),
            days: (1..=3)
                .map(|d| PlanDay {
                    day: format!("Day {}", d),
                    slots: vec![
                        PlanSlot {
                            time: "18:00-18:30".to_string(),
                            task: "Read notes".to_string(),
                        },
                        PlanSlot {
                            time: "18:30-19:00".to_string(),
                            task: "Practice problems".to_string(),
                        },
                    ],
                })
                .collect(),
            tips: vec!["Sleep well.".to_string()],
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_sample_quiz() {
        let quiz = sample_quiz(3);
        assert_eq!(quiz.questions.len(), 3);
        assert!(quiz.questions.iter().all(|q| q.options.len() == 4));
        assert!(quiz.questions.iter().all(|q| q.answer_index == 1));
    }

    #[test]
    fn test_fixtures_sample_plan() {
        let plan = sample_plan();
        assert_eq!(plan.days.len(), 3);
        assert_eq!(plan.days[0].slots.len(), 2);
    }
}
