use std::sync::Arc;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::{
        cooldown::Cooldown,
        document_renderer::DocumentRenderer,
        generation_client::{GeminiProvider, GenerationClient, TextProvider},
        pdf_extraction::{PdfTextExtractor, TextExtractor},
        prompt_builder::PromptBuilder,
        response_normalizer::ResponseNormalizer,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub prompt_builder: PromptBuilder,
    pub normalizer: Arc<ResponseNormalizer>,
    pub renderer: DocumentRenderer,
    pub extractor: Arc<dyn TextExtractor>,
    pub cooldown: Arc<Cooldown>,
    generation_client: Option<Arc<GenerationClient>>,
}

impl AppState {
    /// Wires the production collaborators. A missing API key does not stop
    /// the server; generation requests report it instead.
    pub fn new(config: Config) -> Self {
        let provider: Option<Arc<dyn TextProvider>> = match GeminiProvider::from_config(&config) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                log::warn!("Generation disabled: {}", e);
                None
            }
        };
        Self::with_components(config, provider, Arc::new(PdfTextExtractor))
    }

    pub fn with_components(
        config: Config,
        provider: Option<Arc<dyn TextProvider>>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let locale = config.locale;
        Self {
            prompt_builder: PromptBuilder::new(locale),
            normalizer: Arc::new(ResponseNormalizer::new(locale)),
            renderer: DocumentRenderer::new(locale),
            extractor,
            cooldown: Arc::new(Cooldown::new()),
            generation_client: provider.map(|p| Arc::new(GenerationClient::new(p))),
            config: Arc::new(config),
        }
    }

    pub fn generation_client(&self) -> AppResult<&GenerationClient> {
        self.generation_client
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing GEMINI_API_KEY".to_string()))
    }
}
