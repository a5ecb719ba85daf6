use crate::infrastructure::timezone::timezone_manager::TimezoneManager;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimezoneError {
    InvalidTimezone(String),
    TimeConversionError(String),
}

impl std::fmt::Display for TimezoneError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TimezoneError::InvalidTimezone(msg) => write!(f, "Invalid timezone: {}", msg),
            TimezoneError::TimeConversionError(msg) => write!(f, "Time conversion error: {}", msg),
        }
    }
}

impl std::error::Error for TimezoneError {}

pub type Result<T> = std::result::Result<T, TimezoneError>;

#[derive(Clone)]
pub struct TimezoneService {
    timezone_manager: Arc<TimezoneManager>,
}

impl TimezoneService {
    pub fn new(timezone_manager: Arc<TimezoneManager>) -> Self {
        Self { timezone_manager }
    }

    pub fn validate(&self, timezone: &str) -> Result<Tz> {
        self.timezone_manager
            .get_timezone(timezone)
            .ok_or_else(|| TimezoneError::InvalidTimezone(timezone.to_string()))
    }

    /// Zone names matching a city or zone query
    pub fn search(&self, query: &str) -> Vec<&'static str> {
        self.timezone_manager
            .search_timezones(query)
            .into_iter()
            .map(|tz| tz.name())
            .collect()
    }

    /// Parses "YYYY-MM-DD HH:MM" as a wall-clock time
    pub fn parse_local(&self, input: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(input.trim(), LOCAL_DATETIME_FORMAT).map_err(|e| {
            TimezoneError::TimeConversionError(format!(
                "Invalid date format: {e}. Use YYYY-MM-DD HH:MM"
            ))
        })
    }

    /// Convert a wall-clock time in `tz` to UTC.
    /// During a DST fold the earlier instant wins; times inside a DST gap are rejected.
    pub fn to_utc(&self, local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(datetime) => Ok(datetime.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(TimezoneError::TimeConversionError(format!(
                "{} does not exist in {}",
                local.format(LOCAL_DATETIME_FORMAT),
                tz.name()
            ))),
        }
    }

    pub fn to_local(&self, utc: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
        utc.with_timezone(&tz).naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn service() -> TimezoneService {
        TimezoneService::new(Arc::new(TimezoneManager::new()))
    }

    #[test]
    fn converts_local_time_to_utc() {
        let service = service();
        let tz = service.validate("Europe/Madrid").unwrap();
        let local = service.parse_local("2024-07-01 20:30").unwrap();

        let utc = service.to_utc(local, tz).unwrap();

        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 7, 1, 18, 30, 0).unwrap());
        assert_eq!(service.to_local(utc, tz), local);
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        let service = service();
        let tz = service.validate("America/New_York").unwrap();
        // clocks jump from 02:00 to 03:00 on 2024-03-10
        let local = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();

        assert!(matches!(
            service.to_utc(local, tz),
            Err(TimezoneError::TimeConversionError(_))
        ));
    }

    #[test]
    fn ambiguous_local_time_uses_earliest() {
        let service = service();
        let tz = service.validate("America/New_York").unwrap();
        // 01:30 happens twice on 2024-11-03
        let local = service.parse_local("2024-11-03 01:30").unwrap();

        let utc = service.to_utc(local, tz).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }

    #[test]
    fn unknown_zone_and_bad_format_are_errors() {
        let service = service();
        assert!(service.validate("Nowhere/Special").is_err());
        assert!(service.parse_local("01/02/2024 10:00").is_err());
    }
}
