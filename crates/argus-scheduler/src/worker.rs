//! The per-item worker contract.

use argus_types::WorkItem;

/// Caller-supplied worker invoked once per item.
///
/// Errors are opaque to the engine: they are caught, recorded against the
/// failing item in the status sink, and never stop the chunk.
pub trait ItemWorker {
    fn process(&self, item: &WorkItem) -> anyhow::Result<()>;
}

impl<F> ItemWorker for F
where
    F: Fn(&WorkItem) -> anyhow::Result<()>,
{
    fn process(&self, item: &WorkItem) -> anyhow::Result<()> {
        self(item)
    }
}
