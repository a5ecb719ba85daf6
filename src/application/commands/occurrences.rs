use crate::application::commands::AppContext;
use crate::application::commands::utils::format_event_line;
use crate::application::services::describe_pattern;
use anyhow::Result;
use clap::Args;
use std::fmt::Write;

#[derive(Args, Debug)]
pub struct OccurrenceArgs {
    pub event: u64,

    /// Number of occurrences, anchor included; defaults to PREVIEW_LIMIT
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn run_event_occurrences(ctx: &AppContext, args: OccurrenceArgs) -> Result<String> {
    let limit = args.limit.unwrap_or(ctx.config.preview_limit);
    let event = ctx.event_service.get_event(args.event).await?;
    let dates = ctx
        .event_service
        .preview_event_occurrences(args.event, limit)
        .await?;

    let mut out = format!("#{} {}", event.id, event.title);
    if let Some(pattern) = &event.recurrence {
        write!(out, " · {}", describe_pattern(pattern))?;
    }
    out.push('\n');
    for date in dates {
        writeln!(out, "  {}", ctx.config.date_format.format_date(date))?;
    }

    let materialized = ctx.event_service.occurrences_of(args.event).await?;
    if !materialized.is_empty() {
        writeln!(out, "{} occurrence(s) already materialized", materialized.len())?;
    }
    Ok(out)
}

pub async fn run_materialize(ctx: &AppContext, args: OccurrenceArgs) -> Result<String> {
    let limit = args.limit.unwrap_or(ctx.config.preview_limit);
    let created = ctx
        .event_service
        .materialize_occurrences(args.event, limit)
        .await?;

    let mut out = format!("Created {} occurrence(s) of #{}\n", created.len(), args.event);
    for child in &created {
        writeln!(out, "  {}", format_event_line(child, ctx.config.date_format))?;
    }
    Ok(out)
}
