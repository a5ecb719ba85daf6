use crate::application::commands::utils::date_format::DateFormat;
use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_DATABASE_PATH: &str = "rally.db";
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

/// Runtime settings read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: Level,
    pub preview_limit: usize,
    pub default_timezone: Tz,
    pub date_format: DateFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: Level::INFO,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            default_timezone: Tz::UTC,
            date_format: DateFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level
                .parse()
                .with_context(|| format!("LOG_LEVEL has an invalid value '{}'", level))?;
        }

        if let Some(limit) = get("PREVIEW_LIMIT") {
            let limit: usize = limit
                .parse()
                .with_context(|| format!("PREVIEW_LIMIT has an invalid value '{}'", limit))?;
            if limit == 0 {
                bail!("PREVIEW_LIMIT must be at least 1");
            }
            config.preview_limit = limit;
        }

        if let Some(timezone) = get("DEFAULT_TIMEZONE") {
            config.default_timezone = timezone.parse().map_err(|_| {
                anyhow::anyhow!("DEFAULT_TIMEZONE has an unknown timezone '{}'", timezone)
            })?;
        }

        if let Some(format) = get("DATE_FORMAT") {
            config.date_format = DateFormat::parse(&format)
                .with_context(|| format!("DATE_FORMAT must be YMD, DMY or MDY, got '{}'", format))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.preview_limit, 5);
        assert_eq!(config.default_timezone, Tz::UTC);
        assert_eq!(config.date_format, DateFormat::Ymd);
    }

    #[test]
    fn values_are_read() {
        let config = config_from(&[
            ("DATABASE_PATH", ":memory:"),
            ("LOG_LEVEL", "debug"),
            ("PREVIEW_LIMIT", "8"),
            ("DEFAULT_TIMEZONE", "Asia/Tokyo"),
            ("DATE_FORMAT", "dmy"),
        ])
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from(":memory:"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.preview_limit, 8);
        assert_eq!(config.default_timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.date_format, DateFormat::Dmy);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        for (key, value) in [
            ("LOG_LEVEL", "loud"),
            ("PREVIEW_LIMIT", "0"),
            ("PREVIEW_LIMIT", "many"),
            ("DEFAULT_TIMEZONE", "Atlantis/Capital"),
            ("DATE_FORMAT", "ISO"),
        ] {
            let err = config_from(&[(key, value)]).unwrap_err();
            assert!(format!("{:#}", err).contains(key), "{key}={value}: {err:#}");
        }
    }
}
