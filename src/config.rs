use anyhow::{Context, Result, ensure};
use std::ops::RangeInclusive;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_public_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    /// Days after the end of the work before a still-pending overtime
    /// application expires
    pub overtime_expiry_days: i64,
    pub holiday_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: parse_or("REFRESH_TOKEN_TTL", 604800)?, // default 7 days

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parse_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_public_per_min: parse_or("RATE_PUBLIC_PER_MIN", 120)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            overtime_expiry_days: expiry_days(parse_or("OVERTIME_EXPIRY_DAYS", 30)?)?,
            holiday_cache_ttl_secs: parse_or("HOLIDAY_CACHE_TTL_SECS", 3600)?,
        })
    }
}

/// Ten years at most
pub const OVERTIME_EXPIRY_RANGE: RangeInclusive<i64> = 1..=3650;

fn expiry_days(days: i64) -> Result<i64> {
    ensure!(
        OVERTIME_EXPIRY_RANGE.contains(&days),
        "OVERTIME_EXPIRY_DAYS must be within {}..={}, got {days}",
        OVERTIME_EXPIRY_RANGE.start(),
        OVERTIME_EXPIRY_RANGE.end()
    );
    Ok(days)
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_numbers() {
        let ttl: usize = parse_value("ACCESS_TOKEN_TTL", " 60 ").unwrap();
        assert_eq!(ttl, 60);
    }

    #[test]
    fn invalid_numbers_name_the_key() {
        let err = parse_value::<u32>("RATE_LOGIN_PER_MIN", "lots").unwrap_err();
        assert!(err.to_string().contains("RATE_LOGIN_PER_MIN"));
    }

    #[test]
    fn unset_keys_fall_back() {
        let days: i64 = parse_or("HRMS_TEST_UNSET_EXPIRY_DAYS", 30).unwrap();
        assert_eq!(days, 30);
    }

    #[test]
    fn expiry_days_outside_range_are_rejected() {
        for raw in ["1000000000000", "-1", "0"] {
            let days: i64 = parse_value("OVERTIME_EXPIRY_DAYS", raw).unwrap();
            let err = expiry_days(days).unwrap_err();
            assert!(err.to_string().contains("OVERTIME_EXPIRY_DAYS"), "{raw}");
        }
        assert_eq!(expiry_days(30).unwrap(), 30);
        assert_eq!(expiry_days(3650).unwrap(), 3650);
    }
}
