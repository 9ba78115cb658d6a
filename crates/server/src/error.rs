use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use models::cooldown::CooldownRejection;
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing identity")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    CoolingDown(#[from] CooldownRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CoolingDown(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Multipart(e) => e.status(),
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            log::error!("{self}");
            let body = Json(json!({ "error": "Something went wrong, please try again" }));
            return (status, body).into_response();
        }

        match &self {
            AppError::CoolingDown(rejection) => {
                let seconds = rejection.remaining.num_seconds().max(1);
                let body = Json(json!({
                    "error": self.to_string(),
                    "blocked_until": rejection.blocked_until,
                    "retry_after_seconds": seconds,
                }));

                let mut response = (status, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }
            _ => (status, Json(json!({ "error": self.to_string() }))).into_response(),
        }
    }
}
