use serde::{Deserialize, Serialize};

/// Successful reply of `POST /api/generate`: the raw model text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// Successful reply of `POST /api/pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractTextResponse {
    pub text: String,
}
