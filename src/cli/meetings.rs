use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::args::{MeetingsCliArgs, MeetingsCommand};
use crate::app;
use crate::config::Config;
use crate::meeting::MAX_LIST_LIMIT;

/// Runs against the local database with the pipeline in synchronous mode, so
/// `show --auto` and `recompute` finish before printing.
pub async fn handle_meetings_command(args: MeetingsCliArgs) -> Result<()> {
    let config = Config::load()?;
    let store = app::open_store(&config)?;
    let (pipeline, _) = app::build_pipeline(&config, store, false)?;

    match args.command {
        MeetingsCommand::List { limit } => {
            if !(1..=MAX_LIST_LIMIT).contains(&limit) {
                return Err(anyhow!("--limit must be between 1 and {}", MAX_LIST_LIMIT));
            }

            let meetings = pipeline.list_meetings(limit).await?;
            if meetings.is_empty() {
                println!("No meetings found.");
                return Ok(());
            }
            print_json(&meetings)
        }
        MeetingsCommand::Show { id, auto } => {
            let meeting = pipeline
                .get_meeting(&id, auto)
                .await?
                .ok_or_else(|| anyhow!("Meeting {} not found", id))?;
            print_json(&meeting)
        }
        MeetingsCommand::Recompute { id } => {
            let meeting = pipeline
                .force_recompute(&id)
                .await?
                .ok_or_else(|| anyhow!("Meeting {} not found", id))?;
            print_json(&meeting)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}
