use std::env;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Sessions outlive a typical book-then-cancel cycle so patients are not
/// forced to log back in between the two requests.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 72;

/// Environment contract of the booking service:
/// - `DATABASE_URL` (required) — Postgres connection string
/// - `BIND_ADDR` — listen address, default [`DEFAULT_BIND_ADDR`]
/// - `SESSION_TTL_HOURS` — bearer-session lifetime, default
///   [`DEFAULT_SESSION_TTL_HOURS`]
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let session_ttl_hours = session_ttl_hours(env::var("SESSION_TTL_HOURS").ok());

        Ok(Self {
            database_url,
            bind_addr,
            session_ttl_hours,
        })
    }
}

fn session_ttl_hours(raw: Option<String>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|hours| *hours > 0)
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_falls_back_when_unset_or_invalid() {
        assert_eq!(session_ttl_hours(None), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("not-a-number".into())), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("0".into())), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(session_ttl_hours(Some("-5".into())), DEFAULT_SESSION_TTL_HOURS);
    }

    #[test]
    fn ttl_accepts_explicit_hours() {
        assert_eq!(session_ttl_hours(Some("24".into())), 24);
        assert_eq!(session_ttl_hours(Some(" 8 ".into())), 8);
    }
}
