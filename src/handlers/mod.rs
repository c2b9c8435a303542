pub mod document_handler;
pub mod generation_handler;
pub mod health_handler;

pub use document_handler::{export_pdf, extract_pdf};
pub use generation_handler::{generate, normalize};
pub use health_handler::health_check;
