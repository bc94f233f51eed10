use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::SeatId;

/// Не удалось загрузить данные с бэкенда. Автоматических повторов нет.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("backend returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("circuit breaker is open - backend temporarily unavailable")]
    CircuitOpen,
}

/// Отказы при работе с выбором мест. Тексты показываются пользователю как есть.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("This seat is already booked and cannot be selected.")]
    SeatUnavailable { seat_id: SeatId },
    #[error("You can select up to {max} seats only.")]
    CapacityExceeded { max: usize },
    #[error("Please select at least one seat.")]
    EmptySelection,
}

/// Запись, из которой не получилось собрать место. Из списка выбрасывается молча.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed seat record at index {index}: {reason}")]
pub struct MalformedRecord {
    pub index: usize,
    pub reason: &'static str,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("selection session {0} not found")]
    NotFound(Uuid),
    #[error("seat {0} is not in the current seat list")]
    SeatNotFound(SeatId),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Ошибка на границе HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        ApiError::Session(SessionError::Selection(err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Load(LoadError::CircuitOpen) => (StatusCode::SERVICE_UNAVAILABLE, "LOAD_FAILURE"),
            ApiError::Load(_) => (StatusCode::BAD_GATEWAY, "LOAD_FAILURE"),
            ApiError::Session(SessionError::NotFound(_)) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ApiError::Session(SessionError::SeatNotFound(_)) => (StatusCode::NOT_FOUND, "SEAT_NOT_FOUND"),
            ApiError::Session(SessionError::Selection(err)) => match err {
                SelectionError::SeatUnavailable { .. } => (StatusCode::CONFLICT, "SEAT_UNAVAILABLE"),
                SelectionError::CapacityExceeded { .. } => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
                SelectionError::EmptySelection => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_SELECTION"),
            },
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", code, self);
        }

        let body = Json(json!({
            "success": false,
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
