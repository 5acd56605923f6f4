//! One incremental collection pass.

use argus_collector::{dispatch, EventCollector};
use chrono::Duration;
use clap::Args;
use tracing::info;

use crate::client::{format_event, WebhookNotifier};
use crate::commands::Ctx;

#[derive(Args)]
pub struct CollectArgs {
    /// Print collected events without delivering notifications.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &Ctx, args: &CollectArgs) -> anyhow::Result<()> {
    if ctx.config.watches.is_empty() {
        println!("No watches configured — add [[watch]] entries to your config.");
        return Ok(());
    }

    let store = ctx.open_store()?;
    let client = ctx.drive_client()?;
    let grace = Duration::minutes(ctx.config.collector().grace_minutes);

    let collector = EventCollector::new(&client, &store, grace);
    let events = collector.collect(&ctx.config.watches)?;

    if events.is_empty() {
        println!("No permission changes.");
        return Ok(());
    }

    for collected in &events {
        println!("{}", format_event(&collected.event));
    }

    if args.dry_run {
        info!(events = events.len(), "dry run, skipping notification dispatch");
        return Ok(());
    }

    match &ctx.config.notify {
        Some(notify) => {
            let notifier = WebhookNotifier::new(notify.webhook_url.as_str())?;
            let delivered = dispatch(&events, &notifier);
            println!("{delivered}/{} notifications delivered", events.len());
        }
        None => {
            info!("no [notify] section configured, events printed only");
        }
    }

    Ok(())
}
