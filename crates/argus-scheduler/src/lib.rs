//! Resumable batch scheduling for argus.
//!
//! Turns an unbounded ordered list of work items into a checkpointed queue
//! processed in fixed-size slices across invocations. The queue, cursor and
//! run state live in the durable job slot; re-invocation goes through the
//! injected [`Invoker`] port so the engine is testable without a real timer.

pub mod engine;
pub mod error;
pub mod invoker;
pub mod worker;

pub use engine::{BatchScheduler, ChunkOutcome, EngineConfig, CONTINUE_HANDLER};
pub use error::{Result, SchedulerError};
pub use invoker::{InvokeError, Invoker, InvokerCall, RecordingInvoker, ThreadInvoker};
pub use worker::ItemWorker;
