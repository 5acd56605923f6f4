//! Overall status: watches, job slot, item statuses.

use argus_store::WatermarkStore;
use clap::Args;

use crate::commands::Ctx;

#[derive(Args)]
pub struct StatusArgs {
    /// Also list per-item audit statuses.
    #[arg(long)]
    pub items: bool,
}

pub fn run(ctx: &Ctx, args: &StatusArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;

    println!("Watches:");
    if ctx.config.watches.is_empty() {
        println!("  (none configured)");
    }
    for watch in &ctx.config.watches {
        let last_seen = store
            .last_seen(&watch.id)?
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {} ({}) — {} — last pass: {}",
            watch.display_name,
            watch.id,
            if watch.enabled { "enabled" } else { "disabled" },
            last_seen
        );
    }

    println!();
    match argus_store::JobStore::load(&store)? {
        Some(job) => println!(
            "Audit job {}: {} — {} / {} groups processed",
            job.run_id,
            job.state,
            job.cursor,
            job.items.len()
        ),
        None => println!("Audit job: none queued."),
    }

    if args.items {
        println!();
        println!("Item statuses:");
        for row in store.statuses()? {
            match &row.detail {
                Some(detail) => println!("  {} — {} ({})", row.key, row.state, detail),
                None => println!("  {} — {}", row.key, row.state),
            }
        }
    }

    Ok(())
}
