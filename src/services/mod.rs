pub mod cooldown;
pub mod document_renderer;
pub mod generation_client;
pub mod pdf_extraction;
pub mod pdf_writer;
pub mod prompt_builder;
pub mod quiz_engine;
pub mod response_normalizer;
pub mod study_session;
