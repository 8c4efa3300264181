// src/routes/doctor_routes.rs

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{AppState, ApiMessage, ROLE_DOCTOR},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DoctorDto {
    pub user_id: Uuid,
    pub display_name: String,
    pub specialty: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/doctors", get(list_doctors))
}

/// Directory of active doctors, so clients can pick a doctor_id to book.
pub async fn list_doctors(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiMessage<Vec<DoctorDto>>>, ApiError> {
    let doctors: Vec<DoctorDto> = sqlx::query_as::<_, DoctorDto>(
        r#"
        SELECT user_id, display_name, specialty
        FROM app_user
        WHERE role = $1
          AND is_active = TRUE
        ORDER BY display_name ASC
        "#,
    )
    .bind(ROLE_DOCTOR)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiMessage::with_data("Doctors retrieved.", doctors)))
}
