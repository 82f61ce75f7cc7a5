use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::wallet::unlocks::{CardUnlockServiceError, RepositoryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("wallet error: {0}")]
    Wallet(#[from] CardUnlockServiceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Payload(_) => StatusCode::BAD_REQUEST,
            AppError::Wallet(CardUnlockServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Wallet(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_not_found_maps_to_404() {
        let error = AppError::from(CardUnlockServiceError::Repository(RepositoryError::NotFound));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_outage_maps_to_503() {
        let error = AppError::from(CardUnlockServiceError::Repository(
            RepositoryError::Unavailable("database offline".to_string()),
        ));
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(error.to_string().contains("database offline"));
    }

    #[test]
    fn malformed_json_maps_to_400() {
        let parse_error =
            serde_json::from_str::<serde_json::Value>("{not json").expect_err("invalid json");
        let error = AppError::from(parse_error);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
