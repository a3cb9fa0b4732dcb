use nonempty::NonEmpty;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ImageSize, Model};

#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub n: u8,
    pub size: ImageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
}

#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    pub created: u64,
    pub data: NonEmpty<ImageData>,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub url: String,
    /// Only set by dall-e-3, which rewrites prompts before generating
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Errors returned by the OpenAI images API
///
/// Displays as the status line followed by the raw response body.
/// [`OpenAIApiError::message`] holds `error.message` from the error envelope when there is one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenAIApiError {
    #[error("Error: 400 Bad Request\n{body}")]
    InvalidRequest { message: String, body: String },

    #[error("Error: 401 Unauthorized\n{body}")]
    Authentication { message: String, body: String },

    #[error("Error: 403 Forbidden\n{body}")]
    Permission { message: String, body: String },

    #[error("Error: 404 Not Found\n{body}")]
    NotFound { message: String, body: String },

    #[error("Error: 429 Too Many Requests\n{body}")]
    RateLimit { message: String, body: String },

    #[error("Error: 500 Internal Server Error\n{body}")]
    Api { message: String, body: String },

    #[error("Error: 503 Service Unavailable\n{body}")]
    Overloaded { message: String, body: String },

    /// Catch-all for unexpected status codes
    #[error("Error: {status}\n{body}")]
    Unexpected {
        status: StatusCode,
        message: String,
        body: String,
    },
}

impl OpenAIApiError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.to_string());
        let body = body.to_string();

        match status.as_u16() {
            400 => Self::InvalidRequest { message, body },
            401 => Self::Authentication { message, body },
            403 => Self::Permission { message, body },
            404 => Self::NotFound { message, body },
            429 => Self::RateLimit { message, body },
            500 => Self::Api { message, body },
            503 => Self::Overloaded { message, body },
            _ => Self::Unexpected {
                status,
                message,
                body,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Permission { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Api { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Overloaded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unexpected { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest { message, .. }
            | Self::Authentication { message, .. }
            | Self::Permission { message, .. }
            | Self::NotFound { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Api { message, .. }
            | Self::Overloaded { message, .. }
            | Self::Unexpected { message, .. } => message,
        }
    }
}
