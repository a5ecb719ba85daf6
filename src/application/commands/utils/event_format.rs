use crate::application::commands::utils::date_format::DateFormat;
use crate::application::services::recurrence_parser::describe_pattern;
use crate::domain::Event;
use chrono_tz::Tz;

/// One line summary: "#3 Book club · 20-03-2024 19:00 (Europe/Berlin) · Every week"
pub fn format_event_line(event: &Event, date_format: DateFormat) -> String {
    let tz: Tz = event.timezone.parse().unwrap_or(Tz::UTC);
    let local_start = event.starts_at.with_timezone(&tz).naive_local();

    let mut line = format!(
        "#{} {} · {} ({})",
        event.id,
        event.title,
        date_format.format_datetime(local_start),
        tz.name()
    );

    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    if let Some(pattern) = &event.recurrence {
        line.push_str(&format!(" · {}", describe_pattern(pattern)));
    }
    if let Some(parent) = event.parent_event_id {
        line.push_str(&format!(" · occurrence of #{}", parent));
    }

    line
}
