use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use webground::errors::RelayError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// `provider.type` -> `WEBGROUND_PROVIDER__TYPE`
pub fn to_env_var(field_path: &str) -> String {
    let path = match field_path {
        // The provider table is internally tagged; its tag is what is missing
        "provider" | "type" => "provider.type",
        other => other,
    };
    format!(
        "WEBGROUND_{}",
        path.split('.')
            .map(str::to_uppercase)
            .collect::<Vec<_>>()
            .join("__")
    )
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Non-standard "client closed request"
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// A failed chat request, rendered as `{ "error": ..., "details"?: ... }`
#[derive(Debug)]
pub struct ApiError(RelayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            RelayError::Provider(_) => StatusCode::BAD_GATEWAY,
            RelayError::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match &self.0 {
            RelayError::Template(_) => ErrorResponse {
                error: "Request processing failed".to_string(),
                details: Some(self.0.to_string()),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "chat request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "chat request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
