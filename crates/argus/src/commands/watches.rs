//! List configured watch rows.

use clap::Args;

use crate::commands::Ctx;

#[derive(Args)]
pub struct WatchesArgs {
    /// Include disabled rows.
    #[arg(long)]
    pub all: bool,
}

pub fn run(ctx: &Ctx, args: &WatchesArgs) -> anyhow::Result<()> {
    let rows: Vec<_> = ctx
        .config
        .watches
        .iter()
        .filter(|w| args.all || w.enabled)
        .collect();

    if rows.is_empty() {
        println!("No watches configured — add [[watch]] entries to your config.");
        return Ok(());
    }

    for watch in rows {
        let target = watch.notify_target.as_deref().unwrap_or("-");
        println!(
            "{}\t{}\t{}\t{}",
            watch.id,
            watch.display_name,
            if watch.enabled { "enabled" } else { "disabled" },
            target
        );
    }
    Ok(())
}
