//! Cross-pass event deduplication.
//!
//! Watermark re-scans and overlapping feed records can surface the same
//! logical change more than once. Events repeating in `(target, change
//! kind, entity identifier, minute bucket)` collapse to one representative,
//! keeping the earliest.

use std::collections::HashSet;

use argus_types::{ChangeEvent, ChangeKind};

type DedupKey = (String, ChangeKind, String, i64);

fn key(event: &ChangeEvent) -> DedupKey {
    (
        event.target_id.clone(),
        event.kind,
        event.entity.identifier.clone(),
        event.minute_bucket(),
    )
}

/// Deduplicate a collected batch, returning survivors ordered by time.
pub fn dedupe(mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    events.sort_by_key(|e| e.when);

    let mut seen: HashSet<DedupKey> = HashSet::new();
    events.retain(|e| seen.insert(key(e)));
    events
}
