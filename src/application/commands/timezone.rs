use crate::application::commands::AppContext;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct TimezoneArgs {
    /// City or zone name, e.g. "Madrid" or "america"
    pub query: String,
}

pub fn run_timezone_search(ctx: &AppContext, args: TimezoneArgs) -> Result<String> {
    let matches = ctx.timezone_service.search(&args.query);
    if matches.is_empty() {
        return Ok(format!("No timezones match '{}'\n", args.query));
    }

    Ok(matches.into_iter().map(|name| format!("{}\n", name)).collect())
}
