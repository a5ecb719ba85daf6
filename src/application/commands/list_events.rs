use crate::application::commands::AppContext;
use crate::application::commands::utils::format_event_line;
use crate::application::services::parse_date;
use crate::domain::Event;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub struct ListEventsArgs {
    /// Only events starting on or after this date (YYYY-MM-DD, UTC); defaults to now
    #[arg(long)]
    pub from: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchEventsArgs {
    pub query: String,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

fn render(ctx: &AppContext, events: &[Event], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(events)? + "\n");
    }
    if events.is_empty() {
        return Ok("No events found\n".to_string());
    }

    Ok(events
        .iter()
        .map(|event| format_event_line(event, ctx.config.date_format) + "\n")
        .collect())
}

pub async fn run_list_events(ctx: &AppContext, args: ListEventsArgs) -> Result<String> {
    let from: DateTime<Utc> = match args.from.as_deref() {
        Some(date) => parse_date(date)?
            .and_hms_opt(0, 0, 0)
            .context("Invalid --from")?
            .and_utc(),
        None => Utc::now(),
    };

    let events = ctx.event_service.list_upcoming(from, args.limit).await?;
    render(ctx, &events, args.json)
}

pub async fn run_search_events(ctx: &AppContext, args: SearchEventsArgs) -> Result<String> {
    let events = ctx
        .event_service
        .search_events(&args.query, args.limit)
        .await?;
    render(ctx, &events, false)
}
