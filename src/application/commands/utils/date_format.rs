use chrono::{NaiveDate, NaiveDateTime};

/// Date display preferences for command output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    #[default]
    Ymd,
    Dmy,
    Mdy,
}

impl DateFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format.trim().to_uppercase().as_str() {
            "YMD" => Some(DateFormat::Ymd),
            "DMY" => Some(DateFormat::Dmy),
            "MDY" => Some(DateFormat::Mdy),
            _ => None,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            DateFormat::Ymd => "%Y-%m-%d",
            DateFormat::Dmy => "%d-%m-%Y",
            DateFormat::Mdy => "%m-%d-%Y",
        }
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }

    pub fn format_datetime(&self, datetime: NaiveDateTime) -> String {
        format!(
            "{} {}",
            datetime.date().format(self.pattern()),
            datetime.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_follow_preference() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 27).unwrap();

        assert_eq!(DateFormat::Ymd.format_date(date), "2025-11-27");
        assert_eq!(DateFormat::Dmy.format_date(date), "27-11-2025");
        assert_eq!(DateFormat::Mdy.format_date(date), "11-27-2025");
        assert_eq!(
            DateFormat::Dmy.format_datetime(date.and_hms_opt(9, 5, 0).unwrap()),
            "27-11-2025 09:05"
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(DateFormat::parse("dmy"), Some(DateFormat::Dmy));
        assert_eq!(DateFormat::parse("julian"), None);
    }
}
