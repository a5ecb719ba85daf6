use crate::application::commands::AppContext;
use crate::application::services::{RecurrenceForm, describe_pattern, parse_date};
use anyhow::Result;
use clap::Args;
use std::fmt::Write;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// First occurrence (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// daily, weekly, monthly or yearly
    #[arg(long)]
    pub repeat: String,

    /// Units of the pattern between occurrences
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub interval: i64,

    /// Weekdays for weekly patterns, e.g. "mon,wed,fri" or "1,3,5" (Sunday = 0)
    #[arg(long)]
    pub weekdays: Option<String>,

    /// Last allowed date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Number of dates to show
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Shows the next dates for a pattern the way the event form previews them
pub fn run_preview(ctx: &AppContext, args: PreviewArgs) -> Result<String> {
    let start = parse_date(&args.start)?;
    let pattern = RecurrenceForm::from_flags(
        &args.repeat,
        args.interval,
        args.weekdays.as_deref(),
        args.until,
    )?
    .into_pattern(start)?;

    let limit = args.limit.unwrap_or(ctx.config.preview_limit);
    let dates = ctx.event_service.preview_occurrences(&pattern, limit);

    let mut out = format!("{}\n", describe_pattern(&pattern));
    for (i, date) in dates.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, ctx.config.date_format.format_date(*date))?;
    }
    Ok(out)
}
