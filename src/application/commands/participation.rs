use crate::application::commands::AppContext;
use anyhow::Result;
use clap::Args;
use std::fmt::Write;

#[derive(Args, Debug)]
pub struct ParticipationArgs {
    pub event: u64,
    pub user: u64,
}

#[derive(Args, Debug)]
pub struct EventIdArgs {
    pub event: u64,
}

pub async fn run_join_event(ctx: &AppContext, args: ParticipationArgs) -> Result<String> {
    let joined = ctx.event_service.join_event(args.event, args.user).await?;
    Ok(if joined {
        format!("User {} joined event #{}\n", args.user, args.event)
    } else {
        format!("User {} is already part of event #{}\n", args.user, args.event)
    })
}

pub async fn run_leave_event(ctx: &AppContext, args: ParticipationArgs) -> Result<String> {
    let left = ctx.event_service.leave_event(args.event, args.user).await?;
    Ok(if left {
        format!("User {} left event #{}\n", args.user, args.event)
    } else {
        format!("User {} was not part of event #{}\n", args.user, args.event)
    })
}

pub async fn run_list_participants(ctx: &AppContext, args: EventIdArgs) -> Result<String> {
    let event = ctx.event_service.get_event(args.event).await?;
    let participants = ctx.event_service.participants(args.event).await?;

    let mut out = format!("{} participant(s) in #{} {}\n", participants.len(), event.id, event.title);
    for participant in &participants {
        writeln!(out, "  user {} ({})", participant.user_id, participant.role.as_str())?;
    }

    if let Some(community_id) = event.community_id {
        let members = ctx.event_service.community_members(community_id).await?;
        writeln!(out, "Community #{}: {} member(s)", community_id, members.len())?;
    }
    Ok(out)
}
