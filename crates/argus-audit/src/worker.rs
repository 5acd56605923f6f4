//! The per-group audit worker.

use argus_resolver::{MetadataLookup, PathResolver};
use argus_scheduler::ItemWorker;
use argus_store::{AuditReportSink, AuditRow};
use argus_types::WorkItem;
use tracing::debug;

use crate::search::SharedItemSearch;

/// Resolves the folder tree shared with one group into report rows.
///
/// Each processed group opens a fresh resolution session, so shared
/// ancestors cost one metadata fetch per group regardless of how many items
/// sit under them. A failed search fails the work item (the batch engine
/// records it); a degraded path does not.
pub struct GroupAuditWorker<'a, L: MetadataLookup, S: SharedItemSearch, R: AuditReportSink + ?Sized>
{
    lookup: &'a L,
    search: &'a S,
    report: &'a R,
}

impl<'a, L: MetadataLookup, S: SharedItemSearch, R: AuditReportSink + ?Sized>
    GroupAuditWorker<'a, L, S, R>
{
    pub fn new(lookup: &'a L, search: &'a S, report: &'a R) -> Self {
        Self {
            lookup,
            search,
            report,
        }
    }
}

impl<L: MetadataLookup, S: SharedItemSearch, R: AuditReportSink + ?Sized> ItemWorker
    for GroupAuditWorker<'_, L, S, R>
{
    fn process(&self, item: &WorkItem) -> anyhow::Result<()> {
        let hits = self.search.shared_with(&item.key)?;
        debug!(group = %item.key, hits = hits.len(), "shared item search complete");

        let mut resolver = PathResolver::new(self.lookup);
        let rows: Vec<AuditRow> = hits
            .iter()
            .map(|hit| {
                let path = resolver.resolve(&hit.id);
                AuditRow {
                    group_key: item.key.clone(),
                    item_id: hit.id.clone(),
                    item_name: hit.name.clone(),
                    path: path.joined(),
                    depth: path.depth,
                    container: path.container_name,
                }
            })
            .collect();

        self.report.replace_group_rows(&item.key, &rows)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MockSharedItemSearch;
    use argus_resolver::MockMetadataLookup;
    use argus_store::MockAuditSink;

    fn lookup() -> MockMetadataLookup {
        MockMetadataLookup::new()
            .with_node("doc-1", "Budget.xlsx", &["folder-1"], Some("drv"))
            .with_node("doc-2", "Notes.txt", &["folder-1"], None)
            .with_node("folder-1", "Finance", &["root-1"], None)
            .with_node("root-1", "Shared Root", &[], None)
            .with_container("drv", "Company Drive")
    }

    #[test]
    fn writes_resolved_rows_for_each_hit() {
        let lookup = lookup();
        let search = MockSharedItemSearch::new()
            .with_hit("grp@example.com", "doc-1", "Budget.xlsx")
            .with_hit("grp@example.com", "doc-2", "Notes.txt");
        let report = MockAuditSink::new();
        let worker = GroupAuditWorker::new(&lookup, &search, &report);

        worker
            .process(&WorkItem::new("grp@example.com", "Group"))
            .unwrap();

        let rows = report.group_rows("grp@example.com");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, "Shared Root / Finance / Budget.xlsx");
        assert_eq!(rows[0].depth, 2);
        assert_eq!(rows[0].container, "Company Drive");
        assert_eq!(rows[1].path, "Shared Root / Finance / Notes.txt");
        assert_eq!(rows[1].container, "");
    }

    #[test]
    fn shared_ancestors_fetch_once_per_group() {
        let lookup = lookup();
        let search = MockSharedItemSearch::new()
            .with_hit("grp@example.com", "doc-1", "Budget.xlsx")
            .with_hit("grp@example.com", "doc-2", "Notes.txt");
        let report = MockAuditSink::new();
        let worker = GroupAuditWorker::new(&lookup, &search, &report);

        worker
            .process(&WorkItem::new("grp@example.com", "Group"))
            .unwrap();

        let folder_fetches = lookup
            .fetch_log()
            .iter()
            .filter(|id| id.as_str() == "folder-1")
            .count();
        assert_eq!(folder_fetches, 1);
    }

    #[test]
    fn degraded_path_does_not_fail_the_item() {
        let lookup = MockMetadataLookup::new()
            .with_node("doc-1", "Budget.xlsx", &["hidden"], None)
            .with_denied("hidden");
        let search =
            MockSharedItemSearch::new().with_hit("grp@example.com", "doc-1", "Budget.xlsx");
        let report = MockAuditSink::new();
        let worker = GroupAuditWorker::new(&lookup, &search, &report);

        worker
            .process(&WorkItem::new("grp@example.com", "Group"))
            .unwrap();

        let rows = report.group_rows("grp@example.com");
        assert_eq!(rows[0].path, "hidden / Budget.xlsx");
        assert_eq!(rows[0].depth, 1);
    }

    #[test]
    fn search_failure_fails_the_item() {
        let lookup = MockMetadataLookup::new();
        let search = MockSharedItemSearch::new().with_failing("grp@example.com");
        let report = MockAuditSink::new();
        let worker = GroupAuditWorker::new(&lookup, &search, &report);

        let err = worker
            .process(&WorkItem::new("grp@example.com", "Group"))
            .unwrap_err();
        assert!(err.to_string().contains("shared item search failed"));
    }

    #[test]
    fn empty_search_clears_previous_rows() {
        let lookup = MockMetadataLookup::new();
        let search = MockSharedItemSearch::new();
        let report = MockAuditSink::new();
        report
            .replace_group_rows(
                "grp@example.com",
                &[AuditRow {
                    group_key: "grp@example.com".into(),
                    item_id: "old".into(),
                    item_name: "Old".into(),
                    path: "Old".into(),
                    depth: 0,
                    container: String::new(),
                }],
            )
            .unwrap();

        let worker = GroupAuditWorker::new(&lookup, &search, &report);
        worker
            .process(&WorkItem::new("grp@example.com", "Group"))
            .unwrap();

        assert!(report.group_rows("grp@example.com").is_empty());
    }
}
