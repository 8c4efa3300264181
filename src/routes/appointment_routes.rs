// src/routes/appointment_routes.rs

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{wall_clock, ApiMessage, AppState, AppointmentRow, STATUS_BOOKED},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(book_appointment))
        .route("/appointments/available-slots", get(available_slots))
        .route("/appointments/mine", get(my_appointment))
        .route("/appointments/{appointment_id}", delete(cancel_appointment))
}

/* ============================================================
   Request / response DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub doctor_id: Uuid,
    // Raw string: validated explicitly so malformed input gets a 422 with a
    // stable message instead of a deserializer rejection.
    pub appointment_time: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: Uuid,
    pub date: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MyAppointmentDto {
    pub id: Uuid,
    pub doctor_name: String,
    pub specialty: Option<String>,
    #[serde(with = "wall_clock")]
    pub appointment_time: NaiveDateTime,
    pub status: String,
}

/* ============================================================
   Business day slot grid
   ============================================================ */

const DAY_OPEN_HOUR: u32 = 9;
const DAY_CLOSE_HOUR: u32 = 17;
const SLOT_INTERVAL_MIN: i64 = 30;

/// Half-hour slot starts for one business day: 09:00, 09:30, ... 16:30.
/// The 17:00 close boundary is excluded by construction.
fn day_slots(date: NaiveDate) -> impl Iterator<Item = NaiveDateTime> {
    let open = date.and_hms_opt(DAY_OPEN_HOUR, 0, 0).unwrap();
    let count = i64::from(DAY_CLOSE_HOUR - DAY_OPEN_HOUR) * 60 / SLOT_INTERVAL_MIN;
    (0..count).map(move |i| open + Duration::minutes(i * SLOT_INTERVAL_MIN))
}

/// Slots still open given the doctor's existing appointment times that day.
/// Taken times are compared on their HH:MM component only, regardless of
/// status or seconds, matching the booking conflict check.
fn free_slots(date: NaiveDate, taken: &[NaiveDateTime]) -> Vec<String> {
    let taken: HashSet<String> = taken.iter().map(|t| t.format("%H:%M").to_string()).collect();
    day_slots(date)
        .filter(|slot| !taken.contains(&slot.format("%H:%M").to_string()))
        .map(|slot| slot.format(wall_clock::FORMAT).to_string())
        .collect()
}

/* ============================================================
   Input validation
   ============================================================ */

fn parse_appointment_time(raw: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ApiError> {
    let t = NaiveDateTime::parse_from_str(raw.trim(), wall_clock::FORMAT)
        .map_err(|_| ApiError::validation("appointment_time must be YYYY-MM-DD HH:MM:SS"))?;
    if t <= now {
        return Err(ApiError::validation("appointment_time must be in the future"));
    }
    Ok(t)
}

fn parse_slot_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let d = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation("date must be YYYY-MM-DD"))?;
    if d < today {
        return Err(ApiError::validation("date must be today or later"));
    }
    Ok(d)
}

async fn ensure_user_exists(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    let found: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT user_id
        FROM app_user
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    if found.is_none() {
        return Err(ApiError::validation("doctor_id must reference an existing user"));
    }
    Ok(())
}

/// Advisory read check: any row for the same (doctor_id, appointment_time),
/// whatever its status, occupies the slot.
fn ensure_slot_free(existing: Option<Uuid>) -> Result<(), ApiError> {
    if existing.is_some() {
        return Err(ApiError::slot_conflict());
    }
    Ok(())
}

/// A patient holds at most one future booked appointment, regardless of
/// which doctor or time the new request names.
fn ensure_no_future_booking(existing: Option<Uuid>) -> Result<(), ApiError> {
    if existing.is_some() {
        return Err(ApiError::patient_already_booked());
    }
    Ok(())
}

/// A unique violation on insert means another booking for the same
/// (doctor_id, appointment_time) committed between the advisory read check
/// and this insert; both callers racing past the check still yield exactly
/// one stored row.
fn map_insert_error(e: sqlx::Error) -> ApiError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::slot_conflict(),
        other => other.into(),
    }
}

/* ============================================================
   POST /appointments (book)
   ============================================================ */

pub async fn book_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<ApiMessage<AppointmentRow>>), ApiError> {
    // String inputs are checked before the first query; only a well-formed
    // request costs a round-trip.
    let now = Utc::now().naive_utc();
    let appointment_time = parse_appointment_time(&req.appointment_time, now)?;

    ensure_user_exists(&state, req.doctor_id).await?;

    // The slot conflict check is deliberately status-blind: cancellation is a
    // hard delete, so any surviving row occupies the slot.
    let slot_taken: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT appointment_id
        FROM appointment
        WHERE doctor_id = $1
          AND appointment_time = $2
        "#,
    )
    .bind(req.doctor_id)
    .bind(appointment_time)
    .fetch_optional(&state.db)
    .await?;

    ensure_slot_free(slot_taken)?;

    let already_booked: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT appointment_id
        FROM appointment
        WHERE patient_id = $1
          AND status = $2
          AND appointment_time >= $3
        "#,
    )
    .bind(auth.user_id)
    .bind(STATUS_BOOKED)
    .bind(now)
    .fetch_optional(&state.db)
    .await?;

    ensure_no_future_booking(already_booked)?;

    // The partial unique index on (doctor_id, appointment_time) is the
    // authoritative guard; two callers racing past the reads above cannot
    // both commit.
    let appointment: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(
        r#"
        INSERT INTO appointment (patient_id, doctor_id, appointment_time, status)
        VALUES ($1, $2, $3, $4)
        RETURNING appointment_id, patient_id, doctor_id, appointment_time, status, created_at
        "#,
    )
    .bind(auth.user_id)
    .bind(req.doctor_id)
    .bind(appointment_time)
    .bind(STATUS_BOOKED)
    .fetch_one(&state.db)
    .await
    .map_err(map_insert_error)?;

    tracing::info!(
        appointment_id = %appointment.appointment_id,
        doctor_id = %req.doctor_id,
        "appointment booked"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::with_data("Appointment booked successfully.", appointment)),
    ))
}

/* ============================================================
   GET /appointments/available-slots
   ============================================================ */

pub async fn available_slots(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<AvailableSlotsQuery>,
) -> Result<Json<ApiMessage<Vec<String>>>, ApiError> {
    let today = Utc::now().date_naive();
    let date = parse_slot_date(&q.date, today)?;

    ensure_user_exists(&state, q.doctor_id).await?;

    let day_start = date.and_hms_opt(0, 0, 0).unwrap();
    let day_end = day_start + Duration::days(1);

    // Any status counts as occupying its slot; see free_slots.
    let taken: Vec<NaiveDateTime> = sqlx::query_scalar(
        r#"
        SELECT appointment_time
        FROM appointment
        WHERE doctor_id = $1
          AND appointment_time >= $2
          AND appointment_time < $3
        "#,
    )
    .bind(q.doctor_id)
    .bind(day_start)
    .bind(day_end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiMessage::with_data(
        "Available slots retrieved.",
        free_slots(date, &taken),
    )))
}

/* ============================================================
   GET /appointments/mine
   ============================================================ */

pub async fn my_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiMessage<MyAppointmentDto>>, ApiError> {
    let now = Utc::now().naive_utc();

    let appointment: MyAppointmentDto = sqlx::query_as::<_, MyAppointmentDto>(
        r#"
        SELECT
          a.appointment_id AS id,
          d.display_name AS doctor_name,
          d.specialty,
          a.appointment_time,
          a.status
        FROM appointment a
        JOIN app_user d ON d.user_id = a.doctor_id
        WHERE a.patient_id = $1
          AND a.status = $2
          AND a.appointment_time >= $3
        ORDER BY a.appointment_time ASC
        LIMIT 1
        "#,
    )
    .bind(auth.user_id)
    .bind(STATUS_BOOKED)
    .bind(now)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(ApiError::no_upcoming_appointment)?;

    Ok(Json(ApiMessage::with_data(
        "Appointment retrieved successfully.",
        appointment,
    )))
}

/* ============================================================
   DELETE /appointments/{id} (cancel)
   ============================================================ */

pub async fn cancel_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiMessage<()>>, ApiError> {
    // Hard delete, scoped to the caller's own booked appointment. A single
    // statement, so there is no window between lookup and delete.
    let res = sqlx::query(
        r#"
        DELETE FROM appointment
        WHERE appointment_id = $1
          AND patient_id = $2
          AND status = $3
        "#,
    )
    .bind(appointment_id)
    .bind(auth.user_id)
    .bind(STATUS_BOOKED)
    .execute(&state.db)
    .await?;

    if res.rows_affected() == 0 {
        return Err(ApiError::not_found_or_cancelled());
    }

    tracing::info!(%appointment_id, "appointment cancelled");

    Ok(Json(ApiMessage::plain("Appointment cancelled successfully.")))
}

/* ============================================================
   Tests
   ============================================================ */
