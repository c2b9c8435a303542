use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::quiz_engine::QuizError;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("AI Error")]
    ExternalService {
        status_code: u16,
        message: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("Generation cooldown active")]
    CooldownActive { remaining_seconds: u64 },

    #[error("parse failed")]
    PdfExtraction(String),

    #[error("no file")]
    NoFileProvided,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Quiz error: {0}")]
    QuizState(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    fn detail(&self) -> Option<String> {
        match self {
            AppError::ExternalService { message, .. } => Some(message.clone()),
            AppError::PdfExtraction(detail) => Some(detail.clone()),
            AppError::CooldownActive { remaining_seconds } => {
                Some(format!("Wait {}s before generating again", remaining_seconds))
            }
            _ => None,
        }
    }

    pub fn retry_seconds(&self) -> Option<u64> {
        match self {
            AppError::ExternalService {
                retry_after_seconds,
                ..
            } => *retry_after_seconds,
            AppError::CooldownActive { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}

/// Error envelope returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub code: u16,
    #[serde(rename = "retrySeconds")]
    pub retry_seconds: Option<u64>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService { status_code, .. } => StatusCode::from_u16(*status_code)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::PdfExtraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NoFileProvided => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::QuizState(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            detail: self.detail(),
            code: self.status_code().as_u16(),
            retry_seconds: self.retry_seconds(),
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        AppError::QuizState(err.to_string())
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::InternalError(format!("PDF serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
