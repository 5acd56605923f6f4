//! The per-resource collection pass.

use argus_store::WatermarkStore;
use argus_types::{ChangeEvent, WatchedResource};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::dedup::dedupe;
use crate::feed::ActivityFeed;
use crate::normalize::normalize;
use crate::Result;

/// A deduplicated change event paired with the notification target of the
/// watch row that produced it. Routing stays outside the event itself.
#[derive(Debug, Clone)]
pub struct CollectedEvent {
    pub event: ChangeEvent,
    pub notify_target: Option<String>,
}

/// Runs incremental collection passes over the watched resources.
pub struct EventCollector<'a, F: ActivityFeed, W: WatermarkStore + ?Sized> {
    feed: &'a F,
    watermarks: &'a W,
    /// First observation of a resource scans back this far.
    grace: Duration,
}

impl<'a, F: ActivityFeed, W: WatermarkStore + ?Sized> EventCollector<'a, F, W> {
    pub fn new(feed: &'a F, watermarks: &'a W, grace: Duration) -> Self {
        Self {
            feed,
            watermarks,
            grace,
        }
    }

    /// Collect change events across all enabled resources.
    ///
    /// Per resource: query the feed since the stored watermark (defaulting
    /// to now-minus-grace on first observation), normalize matches, then
    /// advance the watermark to this pass's `now` — including after a failed
    /// query, which bounds the re-scan window at the cost of possibly
    /// missing events inside the failed window. One resource's failure
    /// never aborts the others.
    ///
    /// The returned batch is deduplicated across resources and time-ordered.
    pub fn collect(&self, resources: &[WatchedResource]) -> Result<Vec<CollectedEvent>> {
        let mut routed: Vec<(String, Option<String>)> = Vec::new();
        let mut events: Vec<ChangeEvent> = Vec::new();

        for resource in resources {
            if !resource.enabled {
                debug!(resource = %resource.id, "watch disabled, skipping");
                continue;
            }

            let now = Utc::now();
            let since = match self.watermarks.last_seen(&resource.id)? {
                Some(ts) => ts,
                None => now - self.grace,
            };

            match self.feed.changes_since(&resource.id, since) {
                Ok(actions) => {
                    let before = events.len();
                    for action in &actions {
                        for event in normalize(action) {
                            routed.push((
                                event_key(&event),
                                resource.notify_target.clone(),
                            ));
                            events.push(event);
                        }
                    }
                    debug!(
                        resource = %resource.id,
                        raw = actions.len(),
                        normalized = events.len() - before,
                        "collected resource"
                    );
                }
                Err(e) => {
                    warn!(
                        resource = %resource.id,
                        since = %since,
                        error = %e,
                        "activity feed query failed; advancing watermark over the failed window"
                    );
                }
            }

            // Unconditional: bounds the re-scan window even on failure.
            self.watermarks.advance(&resource.id, now)?;
        }

        let deduped = dedupe(events);
        info!(events = deduped.len(), "collection pass complete");

        let collected = deduped
            .into_iter()
            .map(|event| {
                let notify_target = routed
                    .iter()
                    .find(|(key, _)| *key == event_key(&event))
                    .and_then(|(_, target)| target.clone());
                CollectedEvent {
                    event,
                    notify_target,
                }
            })
            .collect();

        Ok(collected)
    }
}

/// Stable identity used to re-attach routing after dedup.
fn event_key(event: &ChangeEvent) -> String {
    format!(
        "{}|{}|{}|{}",
        event.target_id,
        event.kind,
        event.entity.identifier,
        event.when.timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{MockActivityFeed, RawAction, RawGrantee};
    use argus_store::{MockWatermarkStore, WatermarkStore};
    use argus_types::ChangeKind;
    use chrono::{DateTime, Utc};

    fn grant(target: &str, who: &str, ts: DateTime<Utc>) -> RawAction {
        RawAction {
            target_id: target.into(),
            target_name: target.to_uppercase(),
            timestamp: ts,
            actor: Some("admin@example.com".into()),
            role: Some("writer".into()),
            added: vec![RawGrantee {
                user_email: Some(who.into()),
                ..Default::default()
            }],
            removed: vec![],
        }
    }

    fn watch(id: &str) -> WatchedResource {
        WatchedResource::new(id, id.to_uppercase())
    }

    #[test]
    fn first_observation_uses_grace_window() {
        let feed = MockActivityFeed::new();
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let before = Utc::now();
        collector.collect(&[watch("r1")]).unwrap();

        let queries = feed.queries();
        assert_eq!(queries.len(), 1);
        let since = queries[0].1;
        assert!(since <= before - Duration::minutes(59));
        assert!(since >= before - Duration::minutes(61));
    }

    #[test]
    fn repeated_empty_passes_are_idempotent_noops() {
        let feed = MockActivityFeed::new();
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));
        let watches = [watch("r1")];

        let before_first = Utc::now();
        let events = collector.collect(&watches).unwrap();
        assert!(events.is_empty());
        let after_first = watermarks.last_seen("r1").unwrap().unwrap();
        assert!(after_first >= before_first);

        let before_second = Utc::now();
        let events = collector.collect(&watches).unwrap();
        assert!(events.is_empty());
        let after_second = watermarks.last_seen("r1").unwrap().unwrap();
        // The watermark lands at each call's now
        assert!(after_second >= before_second);
        assert!(after_second >= after_first);
    }

    #[test]
    fn collects_events_since_watermark() {
        let now = Utc::now();
        let feed = MockActivityFeed::new()
            .with_actions("r1", vec![grant("t1", "alice@example.com", now)]);
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let events = collector.collect(&[watch("r1")]).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.kind, ChangeKind::Added);
        assert_eq!(events[0].event.entity.identifier, "alice@example.com");
    }

    #[test]
    fn one_failing_resource_does_not_abort_the_pass() {
        let now = Utc::now();
        let feed = MockActivityFeed::new()
            .with_failing("bad")
            .with_actions("good", vec![grant("t1", "alice@example.com", now)]);
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let events = collector
            .collect(&[watch("bad"), watch("good")])
            .unwrap();
        assert_eq!(events.len(), 1);

        // The failed resource's watermark still advanced
        assert!(watermarks.last_seen("bad").unwrap().is_some());
    }

    #[test]
    fn disabled_resources_are_untouched() {
        let feed = MockActivityFeed::new();
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let mut disabled = watch("r1");
        disabled.enabled = false;
        collector.collect(&[disabled]).unwrap();

        assert!(feed.queries().is_empty());
        assert!(watermarks.last_seen("r1").unwrap().is_none());
    }

    #[test]
    fn duplicate_reports_across_resources_collapse() {
        let ts = Utc::now();
        let mut sibling = grant("t1", "alice@example.com", ts);
        sibling.timestamp = ts;
        let feed = MockActivityFeed::new()
            .with_actions("r1", vec![grant("t1", "alice@example.com", ts)])
            .with_actions("r2", vec![sibling]);
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let events = collector.collect(&[watch("r1"), watch("r2")]).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn routing_target_survives_dedup() {
        let ts = Utc::now();
        let feed = MockActivityFeed::new()
            .with_actions("r1", vec![grant("t1", "alice@example.com", ts)]);
        let watermarks = MockWatermarkStore::new();
        let collector = EventCollector::new(&feed, &watermarks, Duration::minutes(60));

        let mut row = watch("r1");
        row.notify_target = Some("#alerts".into());
        let events = collector.collect(&[row]).unwrap();
        assert_eq!(events[0].notify_target.as_deref(), Some("#alerts"));
    }
}
