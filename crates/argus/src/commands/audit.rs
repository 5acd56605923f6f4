//! Group share audit: batch job control.
//!
//! Two driving modes share the same engine. `run` keeps the process alive
//! and drives chunks through a thread-backed timer; `start`/`continue` are
//! for an external schedule (cron) re-invoking the binary per chunk, with
//! the queue and cursor checkpointed in the store between invocations.

use std::time::Duration;

use argus_audit::{collect_groups, roster_items, GroupAuditWorker};
use argus_scheduler::{
    BatchScheduler, ChunkOutcome, EngineConfig, InvokeError, Invoker, SchedulerError,
    ThreadInvoker,
};
use argus_store::SqliteStore;
use clap::{Args, Subcommand};
use tracing::{info, warn};

use crate::commands::Ctx;

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// Queue a new audit over all directory groups.
    Start,

    /// Process the next chunk of the running audit (for cron-driven runs).
    Continue,

    /// Start an audit and drive it to completion in this process.
    Run,

    /// Cancel the running audit.
    Cancel,

    /// Show the job slot.
    Status,
}

/// Invoker for cron-driven runs: the external schedule owns the cadence, so
/// scheduling a continuation is just a log line.
struct ExternalSchedule;

impl Invoker for ExternalSchedule {
    fn schedule_after(&self, handler: &str, delay: Duration) -> Result<(), InvokeError> {
        info!(handler, delay_secs = delay.as_secs(), "next chunk left to the external schedule");
        Ok(())
    }

    fn cancel_all(&self, _handler: &str) -> Result<(), InvokeError> {
        Ok(())
    }
}

fn engine_config(ctx: &Ctx) -> EngineConfig {
    let scheduler = ctx.config.scheduler();
    EngineConfig {
        chunk_size: scheduler.chunk_size.max(1),
        continue_delay: Duration::from_secs(scheduler.continue_delay_secs),
        item_pause: Duration::from_millis(scheduler.item_pause_ms),
    }
}

pub fn run(ctx: &Ctx, args: &AuditArgs) -> anyhow::Result<()> {
    match args.command {
        AuditCommand::Start => start(ctx),
        AuditCommand::Continue => continue_chunk(ctx),
        AuditCommand::Run => run_to_completion(ctx),
        AuditCommand::Cancel => cancel(ctx),
        AuditCommand::Status => status(ctx),
    }
}

fn start(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let client = ctx.drive_client()?;
    let invoker = ExternalSchedule;
    let engine = BatchScheduler::new(&store, &store, &invoker, engine_config(ctx));

    let groups = collect_groups(&client)?;
    let items = roster_items(&groups);
    println!("Queueing audit of {} groups", items.len());

    match engine.start(items) {
        Ok(job) => {
            println!(
                "Audit {} started; run `argus audit continue` per chunk or `argus audit run`.",
                job.run_id
            );
            Ok(())
        }
        Err(SchedulerError::AlreadyRunning(run_id)) => {
            anyhow::bail!("an audit is already running (run {run_id}); cancel it first")
        }
        Err(e) => Err(e.into()),
    }
}

fn continue_chunk(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let client = ctx.drive_client()?;
    let invoker = ExternalSchedule;
    let engine = BatchScheduler::new(&store, &store, &invoker, engine_config(ctx));
    let worker = GroupAuditWorker::new(&client, &client, &store);

    match engine.continue_chunk(&worker)? {
        ChunkOutcome::Noop => println!("No running audit."),
        ChunkOutcome::Processed {
            processed,
            remaining,
        } => {
            println!("Processed {processed} groups, {remaining} remaining.");
            if remaining == 0 {
                println!("Audit complete.");
            }
        }
    }
    Ok(())
}

fn run_to_completion(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let client = ctx.drive_client()?;
    let config = engine_config(ctx);
    // Generous bound for a tick that never arrives
    let tick_timeout = config.continue_delay * 4 + Duration::from_secs(1);

    let (invoker, ticks) = ThreadInvoker::new();
    let engine = BatchScheduler::new(&store, &store, &invoker, config);
    let worker = GroupAuditWorker::new(&client, &client, &store);

    let groups = collect_groups(&client)?;
    let items = roster_items(&groups);
    let total = items.len();
    println!("Auditing {total} groups");

    match engine.start(items) {
        Ok(_) => {}
        Err(SchedulerError::AlreadyRunning(run_id)) => {
            anyhow::bail!("an audit is already running (run {run_id}); cancel it first")
        }
        Err(e) => return Err(e.into()),
    }

    loop {
        let handler = ticks
            .recv_timeout(tick_timeout)
            .map_err(|_| anyhow::anyhow!("re-invocation timer starved; audit left resumable"))?;
        info!(handler = %handler, "chunk tick");

        match engine.continue_chunk(&worker)? {
            ChunkOutcome::Noop => {
                warn!("tick fired with no running job, stopping");
                break;
            }
            ChunkOutcome::Processed { remaining, .. } => {
                println!("{} / {total} groups audited", total - remaining);
                if remaining == 0 {
                    break;
                }
            }
        }
    }

    print_summary(&store)?;
    Ok(())
}

fn cancel(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let invoker = ExternalSchedule;
    let engine = BatchScheduler::new(&store, &store, &invoker, engine_config(ctx));

    engine.cancel()?;
    println!("Audit canceled; unprocessed groups are marked accordingly.");
    Ok(())
}

fn status(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let invoker = ExternalSchedule;
    let engine = BatchScheduler::new(&store, &store, &invoker, engine_config(ctx));

    match engine.status()? {
        Some(job) => println!(
            "Audit {}: {} — {} / {} groups processed",
            job.run_id,
            job.state,
            job.cursor,
            job.items.len()
        ),
        None => println!("No audit queued."),
    }
    Ok(())
}

/// Summarize per-item outcomes after an in-process run.
fn print_summary(store: &SqliteStore) -> anyhow::Result<()> {
    let statuses = store.statuses()?;
    let failed: Vec<_> = statuses
        .iter()
        .filter(|row| row.state == argus_types::ItemState::Failed)
        .collect();

    println!("Audit complete: {} groups, {} failed", statuses.len(), failed.len());
    for row in failed {
        println!(
            "  failed: {} ({})",
            row.key,
            row.detail.as_deref().unwrap_or("no detail")
        );
    }
    Ok(())
}
