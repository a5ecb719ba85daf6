use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

use crate::domain::value_objects::weekday_format::WeekdayFormat;

/// Unit of repetition for a recurring event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Some(RecurrenceKind::Daily),
            "weekly" | "week" => Some(RecurrenceKind::Weekly),
            "monthly" | "month" => Some(RecurrenceKind::Monthly),
            "yearly" | "year" | "annually" => Some(RecurrenceKind::Yearly),
            _ => None,
        }
    }
}

/// Immutable description of how an event repeats, anchored at its first date.
///
/// A fresh value is built from form state on every change; nothing here is
/// mutated in place. Only the scalar fields are persisted alongside the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternFields")]
pub struct RecurrencePattern {
    kind: RecurrenceKind,
    interval: u32,
    weekdays: Vec<Weekday>,
    end_date: Option<NaiveDate>,
    start_date: NaiveDate,
}

/// Wire shape of a pattern; deserialized values go through the builder so
/// the interval and weekday rules hold.
#[derive(Deserialize)]
struct PatternFields {
    kind: RecurrenceKind,
    interval: u32,
    #[serde(default)]
    weekdays: Vec<Weekday>,
    end_date: Option<NaiveDate>,
    start_date: NaiveDate,
}

impl From<PatternFields> for RecurrencePattern {
    fn from(fields: PatternFields) -> Self {
        RecurrencePattern::new(fields.start_date, fields.kind)
            .with_interval(fields.interval)
            .with_weekdays(fields.weekdays)
            .until(fields.end_date)
    }
}

impl RecurrencePattern {
    pub fn new(start_date: NaiveDate, kind: RecurrenceKind) -> Self {
        Self {
            kind,
            interval: 1,
            weekdays: Vec::new(),
            end_date: None,
            start_date,
        }
    }

    /// Interval of zero is stored as 1
    pub fn with_interval(self, interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            ..self
        }
    }

    /// Weekdays are kept Sunday-first without duplicates
    pub fn with_weekdays(self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        let mut days: Vec<Weekday> = Vec::new();
        for day in weekdays {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        days.sort_by_key(|d| d.to_form_id());
        Self {
            weekdays: days,
            ..self
        }
    }

    pub fn until(self, end_date: Option<NaiveDate>) -> Self {
        Self { end_date, ..self }
    }

    pub fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Weekday filter; only consulted for weekly patterns
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Lazy sequence of occurrence dates, starting with the anchor.
    /// Each call starts over from the anchor.
    pub fn occurrences(&self) -> Occurrences<'_> {
        Occurrences {
            pattern: self,
            next: Some(self.start_date),
        }
    }

    /// Computes the occurrence following `prev`, or `None` when the calendar
    /// runs out or a weekly scan finds no matching day.
    fn step(&self, prev: NaiveDate) -> Option<NaiveDate> {
        let interval = u64::from(self.interval);
        match self.kind {
            RecurrenceKind::Daily => prev.checked_add_days(Days::new(interval)),
            RecurrenceKind::Weekly if self.weekdays.is_empty() => {
                prev.checked_add_days(Days::new(7 * interval))
            }
            RecurrenceKind::Weekly => (1..=7 * interval)
                .map_while(|offset| prev.checked_add_days(Days::new(offset)))
                .find(|candidate| self.weekdays.contains(&candidate.weekday())),
            // checked_add_months clamps to the last day of shorter months
            RecurrenceKind::Monthly => prev.checked_add_months(Months::new(self.interval)),
            RecurrenceKind::Yearly => self
                .interval
                .checked_mul(12)
                .and_then(|months| prev.checked_add_months(Months::new(months))),
        }
    }

    fn within_end(&self, date: NaiveDate) -> bool {
        self.end_date.is_none_or(|end| date <= end)
    }
}

/// Iterator over the occurrences of a [`RecurrencePattern`]
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    pattern: &'a RecurrencePattern,
    next: Option<NaiveDate>,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.take()?;
        self.next = self
            .pattern
            .step(current)
            .filter(|candidate| self.pattern.within_end(*candidate));
        Some(current)
    }
}

impl FusedIterator for Occurrences<'_> {}

/// Produces at most `limit` occurrence dates for `pattern`, anchor first.
/// A limit of zero still yields the anchor.
pub fn generate(pattern: &RecurrencePattern, limit: usize) -> Vec<NaiveDate> {
    pattern.occurrences().take(limit.max(1)).collect()
}
