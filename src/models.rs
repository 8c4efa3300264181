use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
}

/* -------------------------
   Roles (app_user.role)
--------------------------*/

pub const ROLE_PATIENT: i16 = 0;
pub const ROLE_DOCTOR: i16 = 1;

pub fn role_name(role: i16) -> &'static str {
    match role {
        ROLE_PATIENT => "patient",
        ROLE_DOCTOR => "doctor",
        _ => "unknown",
    }
}

/* -------------------------
   Wire format for appointment times
--------------------------*/

/// Appointment times travel as `YYYY-MM-DD HH:MM:SS` wall-clock strings,
/// with no timezone component, and are stored as Postgres `timestamp`.
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/* -------------------------
   API envelope
--------------------------*/

/// Every successful response is `{ "message": ..., "data": ... }`,
/// with `data` omitted when an endpoint has nothing to return.
#[derive(Debug, Serialize)]
pub struct ApiMessage<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiMessage<T> {
    pub fn with_data(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn plain(message: &str) -> Self {
        Self {
            message: message.to_string(),
            data: None,
        }
    }
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl UserProfile {
    pub fn from_row(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            display_name: row.display_name,
            role: role_name(row.role).to_string(),
            specialty: row.specialty,
        }
    }
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: i16,
    pub specialty: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AppointmentRow {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(with = "wall_clock")]
    pub appointment_time: NaiveDateTime,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub const STATUS_BOOKED: &str = "booked";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn wall_clock_serializes_without_timezone() {
        let row = AppointmentRow {
            appointment_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            appointment_time: NaiveDate::from_ymd_opt(2030, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            status: STATUS_BOOKED.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["appointment_time"], "2030-01-01 10:00:00");
        assert_eq!(json["status"], "booked");
    }

    #[test]
    fn api_message_omits_missing_data() {
        let msg: ApiMessage<()> = ApiMessage::plain("Appointment cancelled successfully.");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["message"], "Appointment cancelled successfully.");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn api_message_carries_data() {
        let msg = ApiMessage::with_data("Available slots retrieved.", vec!["2030-01-01 09:00:00"]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"][0], "2030-01-01 09:00:00");
    }

    #[test]
    fn role_names() {
        assert_eq!(role_name(ROLE_PATIENT), "patient");
        assert_eq!(role_name(ROLE_DOCTOR), "doctor");
        assert_eq!(role_name(9), "unknown");
    }
}
