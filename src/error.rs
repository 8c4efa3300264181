use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error body shape shared by every failing endpoint: a human-readable
/// `message` plus a stable machine `code`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{1}")]
    Unauthorized(&'static str, String),
    #[error("{1}")]
    Validation(&'static str, String),
    #[error("{1}")]
    Conflict(&'static str, String),
    #[error("{1}")]
    NotFound(&'static str, String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect.".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired.".into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation("VALIDATION_ERROR", message.into())
    }

    pub fn slot_conflict() -> Self {
        ApiError::Conflict("SLOT_CONFLICT", "This appointment slot is already booked.".into())
    }

    pub fn patient_already_booked() -> Self {
        ApiError::Conflict("PATIENT_ALREADY_BOOKED", "You already have a booked appointment.".into())
    }

    pub fn no_upcoming_appointment() -> Self {
        ApiError::NotFound("NO_UPCOMING_APPOINTMENT", "No upcoming appointment found.".into())
    }

    pub fn not_found_or_cancelled() -> Self {
        ApiError::NotFound(
            "NOT_FOUND_OR_CANCELLED",
            "Appointment not found or already canceled.".into(),
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(..) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(..) => StatusCode::CONFLICT,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::Internal(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(code, _)
            | ApiError::Validation(code, _)
            | ApiError::Conflict(code, _)
            | ApiError::NotFound(code, _) => code,
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(format!("db error: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            message: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(ApiError::slot_conflict().status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::patient_already_booked().status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_errors_map_to_404() {
        assert_eq!(ApiError::no_upcoming_appointment().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::not_found_or_cancelled().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_422() {
        let err = ApiError::validation("date must be YYYY-MM-DD");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn messages_match_api_contract() {
        assert_eq!(ApiError::slot_conflict().to_string(), "This appointment slot is already booked.");
        assert_eq!(
            ApiError::patient_already_booked().to_string(),
            "You already have a booked appointment."
        );
        assert_eq!(
            ApiError::no_upcoming_appointment().to_string(),
            "No upcoming appointment found."
        );
        assert_eq!(
            ApiError::not_found_or_cancelled().to_string(),
            "Appointment not found or already canceled."
        );
    }

    #[test]
    fn error_body_serializes_message_and_code() {
        let body = ErrorBody {
            message: "This appointment slot is already booked.".into(),
            code: "SLOT_CONFLICT".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "This appointment slot is already booked.");
        assert_eq!(json["code"], "SLOT_CONFLICT");
    }
}
