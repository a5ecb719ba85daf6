use crate::domain::entities::recurrence::{RecurrenceKind, RecurrencePattern};
use crate::domain::value_objects::weekday_format::WeekdayFormat;
use chrono::{NaiveDate, Weekday};

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceParseError {
    UnknownKind(String),
    InvalidWeekday(String),
    InvalidDate(String),
}

impl std::fmt::Display for RecurrenceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RecurrenceParseError::UnknownKind(kind) => write!(
                f,
                "Unknown repeat pattern '{}'. Use daily, weekly, monthly or yearly",
                kind
            ),
            RecurrenceParseError::InvalidWeekday(day) => write!(f, "Invalid weekday: {}", day),
            RecurrenceParseError::InvalidDate(date) => {
                write!(f, "Invalid date '{}'. Use YYYY-MM-DD", date)
            }
        }
    }
}

impl std::error::Error for RecurrenceParseError {}

/// Raw recurrence fields as submitted by the event form
#[derive(Debug, Clone, Default)]
pub struct RecurrenceForm {
    pub kind: String,
    pub interval: i64,
    pub weekdays: Vec<i64>,
    pub end_date: Option<String>,
}

impl RecurrenceForm {
    /// Builds the pattern anchored at `start_date`. Intervals below 1 become 1.
    pub fn into_pattern(self, start_date: NaiveDate) -> Result<RecurrencePattern, RecurrenceParseError> {
        let kind = RecurrenceKind::parse(&self.kind)
            .ok_or_else(|| RecurrenceParseError::UnknownKind(self.kind.clone()))?;

        let interval = u32::try_from(self.interval.max(1)).unwrap_or(u32::MAX);

        let weekdays = self
            .weekdays
            .iter()
            .map(|id| {
                u8::try_from(*id)
                    .ok()
                    .and_then(Weekday::from_form_id)
                    .ok_or_else(|| RecurrenceParseError::InvalidWeekday(id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let end_date = self
            .end_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .transpose()?;

        Ok(RecurrencePattern::new(start_date, kind)
            .with_interval(interval)
            .with_weekdays(weekdays)
            .until(end_date))
    }

    /// Form state from command line flags; `weekdays` is a comma separated list
    pub fn from_flags(
        kind: &str,
        interval: i64,
        weekdays: Option<&str>,
        end_date: Option<String>,
    ) -> Result<Self, RecurrenceParseError> {
        Ok(Self {
            kind: kind.to_string(),
            interval,
            weekdays: weekdays.map(parse_weekday_list).transpose()?.unwrap_or_default(),
            end_date,
        })
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, RecurrenceParseError> {
    NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT)
        .map_err(|_| RecurrenceParseError::InvalidDate(input.to_string()))
}

/// Parse a comma separated weekday list ("mon,wed,fri" or "1,3,5") into form ids
pub fn parse_weekday_list(input: &str) -> Result<Vec<i64>, RecurrenceParseError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|day| !day.is_empty())
        .map(|day| {
            if let Ok(id) = day.parse::<i64>() {
                return Ok(id);
            }
            Weekday::from_name(day)
                .map(|weekday| i64::from(weekday.to_form_id()))
                .ok_or_else(|| RecurrenceParseError::InvalidWeekday(day.to_string()))
        })
        .collect()
}

/// Formats a pattern for display, e.g. "Every 2 weeks on Mon, Wed until 2024-06-30"
pub fn describe_pattern(pattern: &RecurrencePattern) -> String {
    let unit = match pattern.kind() {
        RecurrenceKind::Daily => "day",
        RecurrenceKind::Weekly => "week",
        RecurrenceKind::Monthly => "month",
        RecurrenceKind::Yearly => "year",
    };

    let mut description = if pattern.interval() == 1 {
        format!("Every {}", unit)
    } else {
        format!("Every {} {}s", pattern.interval(), unit)
    };

    if pattern.kind() == RecurrenceKind::Weekly && !pattern.weekdays().is_empty() {
        let days = pattern
            .weekdays()
            .iter()
            .map(|d| d.to_short_en())
            .collect::<Vec<_>>()
            .join(", ");
        description.push_str(&format!(" on {}", days));
    }

    if let Some(end) = pattern.end_date() {
        description.push_str(&format!(" until {}", end.format(DATE_INPUT_FORMAT)));
    }

    description
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn form_state_becomes_pattern() {
        let form = RecurrenceForm {
            kind: "Weekly".to_string(),
            interval: 2,
            weekdays: vec![5, 1, 3],
            end_date: Some("2024-02-01".to_string()),
        };

        let pattern = form.into_pattern(start()).unwrap();

        assert_eq!(pattern.kind(), RecurrenceKind::Weekly);
        assert_eq!(pattern.interval(), 2);
        assert_eq!(pattern.weekdays(), &[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(pattern.end_date(), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(pattern.start_date(), start());
    }

    #[test]
    fn non_positive_interval_is_normalized() {
        for interval in [0, -4] {
            let form = RecurrenceForm {
                kind: "daily".to_string(),
                interval,
                ..Default::default()
            };
            assert_eq!(form.into_pattern(start()).unwrap().interval(), 1);
        }
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let bad_kind = RecurrenceForm {
            kind: "hourly".to_string(),
            interval: 1,
            ..Default::default()
        };
        assert!(matches!(
            bad_kind.into_pattern(start()),
            Err(RecurrenceParseError::UnknownKind(_))
        ));

        let bad_day = RecurrenceForm {
            kind: "weekly".to_string(),
            interval: 1,
            weekdays: vec![7],
            end_date: None,
        };
        assert_eq!(
            bad_day.into_pattern(start()),
            Err(RecurrenceParseError::InvalidWeekday("7".to_string()))
        );

        let bad_end = RecurrenceForm {
            kind: "monthly".to_string(),
            interval: 1,
            weekdays: vec![],
            end_date: Some("31/01/2024".to_string()),
        };
        assert!(matches!(
            bad_end.into_pattern(start()),
            Err(RecurrenceParseError::InvalidDate(_))
        ));
    }

    #[test]
    fn blank_end_date_means_open_ended() {
        let form = RecurrenceForm {
            kind: "yearly".to_string(),
            interval: 1,
            weekdays: vec![],
            end_date: Some("  ".to_string()),
        };
        assert_eq!(form.into_pattern(start()).unwrap().end_date(), None);
    }

    #[test]
    fn weekday_lists_accept_names_and_ids() {
        assert_eq!(parse_weekday_list("mon, Wed,5").unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_weekday_list("").unwrap(), Vec::<i64>::new());
        assert!(parse_weekday_list("mon,funday").is_err());
    }

    #[test]
    fn describes_patterns() {
        let pattern = RecurrencePattern::new(start(), RecurrenceKind::Weekly)
            .with_interval(2)
            .with_weekdays([Weekday::Wed, Weekday::Mon])
            .until(NaiveDate::from_ymd_opt(2024, 6, 30));

        assert_eq!(
            describe_pattern(&pattern),
            "Every 2 weeks on Mon, Wed until 2024-06-30"
        );
        assert_eq!(
            describe_pattern(&RecurrencePattern::new(start(), RecurrenceKind::Daily)),
            "Every day"
        );
    }
}
