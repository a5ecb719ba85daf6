pub mod create_event;
pub mod list_events;
pub mod occurrences;
pub mod participation;
pub mod preview;
pub mod timezone;
pub mod utils;

pub use create_event::{CreateEventArgs, run_create_event};
pub use list_events::{ListEventsArgs, SearchEventsArgs, run_list_events, run_search_events};
pub use occurrences::{OccurrenceArgs, run_event_occurrences, run_materialize};
pub use participation::{EventIdArgs, ParticipationArgs, run_join_event, run_leave_event, run_list_participants};
pub use preview::{PreviewArgs, run_preview};
pub use timezone::{TimezoneArgs, run_timezone_search};

use crate::application::services::{EventService, TimezoneService};
use crate::infrastructure::config::AppConfig;
use clap::Subcommand;
use std::sync::Arc;

/// Everything a command needs to run
#[derive(Clone)]
pub struct AppContext {
    pub event_service: Arc<EventService>,
    pub timezone_service: Arc<TimezoneService>,
    pub config: AppConfig,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the next dates of a recurrence pattern
    Preview(PreviewArgs),
    /// Create an event, optionally recurring and with a new community
    Create(CreateEventArgs),
    /// List upcoming events
    List(ListEventsArgs),
    /// Search events by title, description or location
    Search(SearchEventsArgs),
    /// Join an event as a guest
    Join(ParticipationArgs),
    /// Leave an event
    Leave(ParticipationArgs),
    /// List the participants of an event
    Participants(EventIdArgs),
    /// Show the next dates of a stored recurring event
    Occurrences(OccurrenceArgs),
    /// Write the next occurrences of a recurring event as their own events
    Materialize(OccurrenceArgs),
    /// Look up IANA timezones by city or name
    Timezones(TimezoneArgs),
}

pub async fn run_command(ctx: &AppContext, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Preview(args) => run_preview(ctx, args),
        Command::Create(args) => run_create_event(ctx, args).await,
        Command::List(args) => run_list_events(ctx, args).await,
        Command::Search(args) => run_search_events(ctx, args).await,
        Command::Join(args) => run_join_event(ctx, args).await,
        Command::Leave(args) => run_leave_event(ctx, args).await,
        Command::Participants(args) => run_list_participants(ctx, args).await,
        Command::Occurrences(args) => run_event_occurrences(ctx, args).await,
        Command::Materialize(args) => run_materialize(ctx, args).await,
        Command::Timezones(args) => run_timezone_search(ctx, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bootstrap::build_context;
    use crate::infrastructure::database::connection::IN_MEMORY_PATH;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    async fn run(ctx: &AppContext, args: &[&str]) -> anyhow::Result<String> {
        let cli = TestCli::try_parse_from(std::iter::once("rally").chain(args.iter().copied()))?;
        run_command(ctx, cli.command).await
    }

    async fn context() -> AppContext {
        let config = AppConfig {
            database_path: IN_MEMORY_PATH.into(),
            ..AppConfig::default()
        };
        build_context(config).await.expect("in-memory context")
    }

    #[tokio::test]
    async fn preview_lists_weekly_dates() {
        let ctx = context().await;
        let out = run(
            &ctx,
            &[
                "preview", "--start", "2024-01-01", "--repeat", "weekly", "--weekdays", "mon,wed",
                "--limit", "4",
            ],
        )
        .await
        .unwrap();

        assert!(out.contains("1. 2024-01-01"));
        assert!(out.contains("2. 2024-01-03"));
        assert!(out.contains("3. 2024-01-08"));
        assert!(out.contains("4. 2024-01-10"));
        assert!(!out.contains("5."));
    }

    #[tokio::test]
    async fn create_then_join_and_list_participants() {
        let ctx = context().await;
        let out = run(
            &ctx,
            &[
                "create", "--creator", "1", "--title", "Board games", "--start",
                "2030-05-01 18:00", "--timezone", "Europe/Madrid", "--repeat", "monthly",
                "--community", "Meeples",
            ],
        )
        .await
        .unwrap();
        assert!(out.contains("Created #1 Board games"));
        assert!(out.contains("Community #1 \"Meeples\" created"));
        assert!(out.contains("2030-06-01"));

        let joined = run(&ctx, &["join", "1", "2"]).await.unwrap();
        assert!(joined.contains("User 2 joined event #1"));
        let again = run(&ctx, &["join", "1", "2"]).await.unwrap();
        assert!(again.contains("already part"));

        let participants = run(&ctx, &["participants", "1"]).await.unwrap();
        assert!(participants.contains("2 participant(s)"));
        assert!(participants.contains("user 1 (host)"));
        assert!(participants.contains("Community #1: 2 member(s)"));
    }

    #[tokio::test]
    async fn materialize_writes_children_once() {
        let ctx = context().await;
        run(
            &ctx,
            &[
                "create", "--creator", "1", "--title", "Standup", "--start", "2030-01-07 09:00",
                "--timezone", "UTC", "--repeat", "daily", "--until", "2030-01-09",
            ],
        )
        .await
        .unwrap();

        let first = run(&ctx, &["materialize", "1"]).await.unwrap();
        assert!(first.contains("Created 2 occurrence(s) of #1"));
        let second = run(&ctx, &["materialize", "1"]).await.unwrap();
        assert!(second.contains("Created 0 occurrence(s)"));

        let listed = run(&ctx, &["list", "--from", "2030-01-01", "--json"]).await.unwrap();
        let events: Vec<serde_json::Value> = serde_json::from_str(&listed).unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn invalid_input_is_reported_without_writing() {
        let ctx = context().await;
        let err = run(
            &ctx,
            &[
                "create", "--creator", "1", "--title", "Trip", "--start", "2030-01-01 10:00",
                "--timezone", "Mars/Olympus",
            ],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));

        let listed = run(&ctx, &["list", "--from", "2000-01-01"]).await.unwrap();
        assert_eq!(listed, "No events found\n");
    }

    #[tokio::test]
    async fn timezones_finds_city() {
        let ctx = context().await;
        let out = run(&ctx, &["timezones", "Madrid"]).await.unwrap();
        assert!(out.contains("Europe/Madrid"));
    }
}
