use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Offset of the business timezone from UTC, in minutes. "Today" and every
    /// stored check-in/out time are expressed in this timezone.
    pub utc_offset_minutes: i32,
    /// Check-ins strictly after this time of day count as late.
    pub late_after: NaiveTime,
    /// Checkout time used by manual checkout when the caller gives none.
    pub default_checkout_time: NaiveTime,

    // Push notifications
    pub fcm_project_id: Option<String>,
    pub fcm_service_account_path: Option<String>,

    pub enable_reminders: bool,
    pub run_migrations: bool,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn time_or(key: &str, default: NaiveTime) -> Result<NaiveTime> {
    match env::var(key) {
        Ok(raw) => parse_time_of_day(&raw).with_context(|| format!("{key} must be HH:MM or HH:MM:SS")),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let utc_offset_minutes: i32 = parse_or("BUSINESS_UTC_OFFSET_MINUTES", 0)?;
        if FixedOffset::east_opt(utc_offset_minutes * 60).is_none() {
            return Err(anyhow!(
                "BUSINESS_UTC_OFFSET_MINUTES out of range: {utc_offset_minutes}"
            ));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: parse_or("REFRESH_TOKEN_TTL", 604800)?, // default 7 days

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parse_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            utc_offset_minutes,
            late_after: time_or("LATE_AFTER", NaiveTime::from_hms_opt(10, 5, 0).unwrap_or_default())?,
            default_checkout_time: time_or(
                "DEFAULT_CHECKOUT_TIME",
                NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            )?,

            fcm_project_id: optional("FCM_PROJECT_ID"),
            fcm_service_account_path: optional("FCM_SERVICE_ACCOUNT_PATH"),

            enable_reminders: parse_or("ENABLE_REMINDERS", false)?,
            run_migrations: parse_or("RUN_MIGRATIONS", true)?,
        })
    }

    pub fn business_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/hrms_test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            utc_offset_minutes: 360,
            late_after: NaiveTime::from_hms_opt(10, 5, 0).unwrap(),
            default_checkout_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            fcm_project_id: None,
            fcm_service_account_path: None,
            enable_reminders: false,
            run_migrations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_of_day_with_and_without_seconds() {
        assert_eq!(
            parse_time_of_day("10:05"),
            NaiveTime::from_hms_opt(10, 5, 0)
        );
        assert_eq!(
            parse_time_of_day(" 18:30:15 "),
            NaiveTime::from_hms_opt(18, 30, 15)
        );
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn business_offset_follows_minutes() {
        let cfg = Config::for_tests();
        assert_eq!(cfg.business_offset().local_minus_utc(), 6 * 3600);
    }
}
