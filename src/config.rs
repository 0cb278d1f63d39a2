use std::env;

use anyhow::Context;
use chrono::{FixedOffset, Offset, Utc};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub cors_origins: Vec<String>,
    /// Offset used to assign orders to calendar days, weeks and months in reports.
    pub report_utc_offset_hours: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);
        let jwt_ttl_minutes = parse_or("JWT_TTL_MINUTES", 30);
        let report_utc_offset_hours = parse_or("REPORT_UTC_OFFSET_HOURS", -3);
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            jwt_secret,
            jwt_ttl_minutes,
            cors_origins,
            report_utc_offset_hours,
        })
    }

    /// Business time zone for report bucketing. Out-of-range offsets fall back to UTC.
    pub fn report_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.report_utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_offset(hours: i32) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            db_max_connections: 1,
            jwt_secret: "secret".into(),
            jwt_ttl_minutes: 30,
            cors_origins: vec![],
            report_utc_offset_hours: hours,
        }
    }

    #[test]
    fn report_offset_uses_configured_hours() {
        assert_eq!(config_with_offset(-3).report_offset().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn report_offset_falls_back_to_utc_when_out_of_range() {
        assert_eq!(config_with_offset(48).report_offset().local_minus_utc(), 0);
    }
}
