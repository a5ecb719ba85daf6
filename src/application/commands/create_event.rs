use crate::application::commands::AppContext;
use crate::application::commands::utils::format_event_line;
use crate::application::services::{NewEvent, RecurrenceForm};
use crate::domain::{EventTheme, NewCommunity};
use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::fmt::Write;

#[derive(Args, Debug)]
pub struct CreateEventArgs {
    /// User id of the host
    #[arg(long)]
    pub creator: u64,

    #[arg(long)]
    pub title: String,

    /// Local start time, "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub start: String,

    /// Local end time, "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub end: Option<String>,

    /// IANA timezone of the event; defaults to DEFAULT_TIMEZONE
    #[arg(long)]
    pub timezone: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Invitation theme: classic, party, minimal or seasonal
    #[arg(long, default_value = "classic")]
    pub theme: String,

    /// Make the event recurring: daily, weekly, monthly or yearly
    #[arg(long)]
    pub repeat: Option<String>,

    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub interval: i64,

    /// Weekdays for weekly events, e.g. "mon,wed,fri"
    #[arg(long)]
    pub weekdays: Option<String>,

    /// Last date of the series (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Also create a community with this name, with the host as admin
    #[arg(long)]
    pub community: Option<String>,

    #[arg(long)]
    pub community_description: Option<String>,
}

pub async fn run_create_event(ctx: &AppContext, args: CreateEventArgs) -> Result<String> {
    let theme = EventTheme::parse(&args.theme)
        .ok_or_else(|| anyhow!("Unknown theme '{}'. Use classic, party, minimal or seasonal", args.theme))?;

    let starts_at_local = ctx
        .timezone_service
        .parse_local(&args.start)
        .context("Invalid --start")?;
    let ends_at_local = args
        .end
        .as_deref()
        .map(|end| ctx.timezone_service.parse_local(end))
        .transpose()
        .context("Invalid --end")?;

    let recurrence = args
        .repeat
        .as_deref()
        .map(|kind| {
            RecurrenceForm::from_flags(kind, args.interval, args.weekdays.as_deref(), args.until.clone())
        })
        .transpose()?;

    let new_event = NewEvent {
        creator_id: args.creator,
        title: args.title,
        description: args.description,
        location: args.location,
        theme,
        starts_at_local,
        ends_at_local,
        timezone: args
            .timezone
            .unwrap_or_else(|| ctx.config.default_timezone.name().to_string()),
        recurrence,
        community: args.community.map(|name| NewCommunity {
            name,
            description: args.community_description,
        }),
    };

    let created = ctx.event_service.create_event(new_event).await?;
    let date_format = ctx.config.date_format;

    let mut out = format!("Created {}\n", format_event_line(&created.event, date_format));
    if let Some(community) = &created.community {
        writeln!(out, "Community #{} \"{}\" created", community.id, community.name)?;
    }

    if let Some(pattern) = &created.event.recurrence {
        writeln!(out, "Next dates:")?;
        for date in ctx
            .event_service
            .preview_occurrences(pattern, ctx.config.preview_limit)
        {
            writeln!(out, "  {}", date_format.format_date(date))?;
        }
    }

    Ok(out)
}
