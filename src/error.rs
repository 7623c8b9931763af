use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::jwt::TokenError;

/// Why the auth gate turned a request away. Only logged, never sent.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("no bearer token supplied")]
    MissingToken,
    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthFailure),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Conflict(_) | AppError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message the client gets to see.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".into(),
            AppError::Unauthenticated(AuthFailure::MissingToken) => {
                "No token, authorization denied".into()
            }
            AppError::Unauthenticated(AuthFailure::InvalidToken(_)) => "Token is not valid".into(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::Internal(_) => "Server error".into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e).context("database query failed"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(e) => error!(error = ?e, "request failed"),
            AppError::Unauthenticated(reason) => warn!(%reason, "unauthenticated request"),
            _ => {}
        }
        (self.status(), Json(json!({ "msg": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_share_one_public_message() {
        let expired = AppError::from(AuthFailure::InvalidToken(TokenError::Expired));
        let forged = AppError::from(AuthFailure::InvalidToken(TokenError::InvalidSignature));
        let garbage = AppError::from(AuthFailure::InvalidToken(TokenError::Malformed));

        for err in [&expired, &forged, &garbage] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "Token is not valid");
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = AppError::from(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Server error");
    }

    #[test]
    fn not_found_names_the_resource_only() {
        let err = AppError::NotFound("Expense");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Expense not found");
    }

    #[tokio::test]
    async fn response_body_carries_msg() {
        let res = AppError::InvalidCredentials.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["msg"], "Invalid credentials");
    }
}
