use std::{collections::HashMap, sync::Arc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{GenerationRequest, Locale, Mode, NormalizedArtifact},
    services::{
        cooldown::Cooldown,
        document_renderer::DocumentRenderer,
        generation_client::GenerationClient,
        pdf_writer,
        prompt_builder::PromptBuilder,
        quiz_engine::{QuizResult, QuizSession},
        response_normalizer::ResponseNormalizer,
    },
};

/// A PDF ready to be handed to the user.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One user's interaction with the generator: the latest artifact and
/// request per mode, the quiz being answered and the generation cooldown.
///
/// Regeneration replaces the previous artifact of that mode. Dropping the
/// session cancels the cooldown timer.
pub struct StudySession {
    prompts: PromptBuilder,
    client: Arc<GenerationClient>,
    normalizer: ResponseNormalizer,
    renderer: DocumentRenderer,
    cooldown: Cooldown,
    cooldown_seconds: u64,
    last_requests: HashMap<Mode, GenerationRequest>,
    artifacts: HashMap<Mode, NormalizedArtifact>,
    quiz: Option<QuizSession>,
}

impl StudySession {
    pub fn new(client: Arc<GenerationClient>, locale: Locale, cooldown_seconds: u64) -> Self {
        Self {
            prompts: PromptBuilder::new(locale),
            client,
            normalizer: ResponseNormalizer::new(locale),
            renderer: DocumentRenderer::new(locale),
            cooldown: Cooldown::new(),
            cooldown_seconds,
            last_requests: HashMap::new(),
            artifacts: HashMap::new(),
            quiz: None,
        }
    }

    /// Runs build, call and normalize for `request`. Refused while the
    /// cooldown is running; a failed call leaves the previous state intact.
    pub async fn generate(&mut self, request: GenerationRequest) -> AppResult<&NormalizedArtifact> {
        if self.cooldown.is_active() {
            return Err(AppError::CooldownActive {
                remaining_seconds: self.cooldown.remaining(),
            });
        }

        let mode = request.mode();
        let prompt = self.prompts.build(&request);
        let reply = self.client.generate(&prompt).await?;
        let artifact = self.normalizer.normalize(mode, &reply);

        if let NormalizedArtifact::Quiz(quiz) = &artifact {
            self.quiz = Some(QuizSession::new(quiz.clone()));
        }
        self.last_requests.insert(mode, request);
        self.cooldown.start(self.cooldown_seconds);
        log::info!(
            "Generated {} artifact '{}'; cooldown {}s",
            mode,
            artifact.title(),
            self.cooldown_seconds
        );

        self.artifacts.insert(mode, artifact);
        Ok(&self.artifacts[&mode])
    }

    /// Repeats the last request made in `mode`.
    pub async fn regenerate(&mut self, mode: Mode) -> AppResult<&NormalizedArtifact> {
        let request = self.last_requests.get(&mode).cloned().ok_or_else(|| {
            AppError::ValidationError(format!("no previous {} request to regenerate", mode))
        })?;
        self.generate(request).await
    }

    pub fn artifact(&self, mode: Mode) -> Option<&NormalizedArtifact> {
        self.artifacts.get(&mode)
    }

    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown.remaining()
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    fn quiz_mut(&mut self) -> AppResult<&mut QuizSession> {
        self.quiz
            .as_mut()
            .ok_or_else(|| AppError::QuizState("no quiz has been generated".to_string()))
    }

    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> AppResult<()> {
        self.quiz_mut()?.select_option(question_index, option_index)?;
        Ok(())
    }

    pub fn submit_quiz(&mut self) -> AppResult<QuizResult> {
        let result = self.quiz_mut()?.submit()?;
        log::info!("Quiz submitted: {}/{}", result.score, result.total);
        Ok(result)
    }

    pub fn retake_quiz(&mut self) -> AppResult<()> {
        self.quiz_mut()?.retake();
        Ok(())
    }

    /// Renders the current artifact of `mode` to PDF.
    pub fn export(&self, mode: Mode) -> AppResult<ExportedDocument> {
        let artifact = self.artifact(mode).ok_or_else(|| {
            AppError::ValidationError(format!("nothing generated yet for {}", mode))
        })?;
        let rendered = self.renderer.render(artifact);
        Ok(ExportedDocument {
            file_name: artifact.export_file_name(),
            bytes: pdf_writer::write_pdf(&rendered)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        models::domain::QuestionStyle,
        services::generation_client::{MockTextProvider, ProviderError},
    };

    const QUIZ_REPLY: &str = r#"{"title":"Cells","questions":[
        {"question":"Powerhouse?","options":["Nucleus","Mitochondria"],"answerIndex":1},
        {"question":"Unit of life?","options":["Cell","Atom"],"answerIndex":0}
    ]}"#;

    fn quiz_request() -> GenerationRequest {
        GenerationRequest::Quiz {
            subject: "Biology".to_string(),
            source_text: "Cells and organelles".to_string(),
            question_count: 2,
            style: QuestionStyle::MultipleChoice,
        }
    }

    fn session_with(provider: MockTextProvider, cooldown_seconds: u64) -> StudySession {
        let client = Arc::new(GenerationClient::new(Arc::new(provider)));
        StudySession::new(client, Locale::English, cooldown_seconds)
    }

    #[tokio::test(start_paused = true)]
    async fn quiz_generation_opens_a_fresh_quiz_session() {
        let mut provider = MockTextProvider::new();
        provider
            .expect_complete()
            .times(2)
            .returning(|_| Ok(QUIZ_REPLY.to_string()));
        let mut session = session_with(provider, 0);

        session.generate(quiz_request()).await.expect("generation succeeds");
        session.select_answer(0, 1).expect("valid answer");
        assert_eq!(session.quiz().map(|q| q.selections()[0]), Some(Some(1)));

        session.regenerate(Mode::Quiz).await.expect("regeneration succeeds");
        let quiz = session.quiz().expect("quiz exists");
        assert_eq!(quiz.selections(), &[None, None]);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_blocks_until_elapsed() {
        let mut provider = MockTextProvider::new();
        provider
            .expect_complete()
            .times(2)
            .returning(|_| Ok(QUIZ_REPLY.to_string()));
        let mut session = session_with(provider, 8);

        session.generate(quiz_request()).await.expect("first generation");
        assert_eq!(session.cooldown_remaining(), 8);

        let err = session.regenerate(Mode::Quiz).await.expect_err("cooldown active");
        assert!(matches!(err, AppError::CooldownActive { remaining_seconds: 8 }));

        tokio::time::sleep(Duration::from_secs(9)).await;
        session.regenerate(Mode::Quiz).await.expect("cooldown elapsed");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_generation_keeps_previous_artifact_and_skips_cooldown() {
        let mut provider = MockTextProvider::new();
        let mut calls = 0;
        provider.expect_complete().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(QUIZ_REPLY.to_string())
            } else {
                Err(ProviderError::new(Some(503), "overloaded"))
            }
        });
        let mut session = session_with(provider, 0);

        session.generate(quiz_request()).await.expect("first generation");
        let err = session.regenerate(Mode::Quiz).await.expect_err("provider fails");

        assert!(matches!(err, AppError::ExternalService { status_code: 503, .. }));
        assert_eq!(session.artifact(Mode::Quiz).map(|a| a.title()), Some("Cells"));
        assert_eq!(session.cooldown_remaining(), 0);
    }

    #[tokio::test]
    async fn regenerate_without_history_is_rejected() {
        let mut session = session_with(MockTextProvider::new(), 0);
        let err = session.regenerate(Mode::Plan).await.expect_err("no history");
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn quiz_round_trip_and_export() {
        let mut provider = MockTextProvider::new();
        provider
            .expect_complete()
            .returning(|_| Ok(QUIZ_REPLY.to_string()));
        let mut session = session_with(provider, 0);
        session.generate(quiz_request()).await.expect("generation succeeds");

        session.select_answer(0, 1).expect("valid answer");
        session.select_answer(1, 1).expect("valid answer");
        let result = session.submit_quiz().expect("submit");
        assert_eq!((result.score, result.total), (1, 2));

        session.retake_quiz().expect("retake");
        assert_eq!(session.quiz().map(|q| q.score()), Some(0));

        let exported = session.export(Mode::Quiz).expect("export");
        assert_eq!(exported.file_name, "Cells.pdf");
        assert!(exported.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn quiz_actions_need_a_quiz() {
        let mut session = session_with(MockTextProvider::new(), 0);
        assert!(matches!(session.submit_quiz(), Err(AppError::QuizState(_))));
        assert!(matches!(session.export(Mode::Sheet), Err(AppError::ValidationError(_))));
    }
}
