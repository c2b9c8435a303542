use std::env;

use secrecy::SecretString;

use crate::models::domain::Locale;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cooldown_seconds: u64,
    pub locale: Locale,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            gemini_model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cooldown_seconds: env::var("COOLDOWN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
            locale: env::var("OUTPUT_LOCALE")
                .ok()
                .and_then(|code| Locale::from_code(&code))
                .unwrap_or_default(),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(20 * 1024 * 1024),
        }
    }

    /// Logs a warning for settings that make generation impossible.
    /// The server still starts so PDF extraction and export keep working.
    pub fn warn_if_incomplete(&self) {
        if self.gemini_api_key.is_none() {
            log::warn!("GEMINI_API_KEY is not set; generation requests will fail");
        }
        if self.cooldown_seconds == 0 {
            log::warn!("COOLDOWN_SECONDS is 0; repeated generation is not throttled");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            gemini_api_key: Some(SecretString::from("test_api_key".to_string())),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cooldown_seconds: 8,
            locale: Locale::English,
            max_upload_bytes: 1024 * 1024,
        }
    }
}
