//! The paginated group directory and roster assembly.

use argus_types::WorkItem;
use tracing::debug;

use crate::{AuditError, Result};

/// Defensive bound on directory paging, against a service that never
/// exhausts its cursor.
const MAX_PAGES: usize = 10_000;

/// One directory group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Stable key, typically the group email address.
    pub key: String,
    pub display_name: String,
}

/// One page of the group listing.
#[derive(Debug, Clone)]
pub struct GroupPage {
    pub groups: Vec<Group>,
    /// Cursor for the next page, absent on the last one.
    pub next: Option<String>,
}

/// Paginated group enumeration service.
pub trait GroupDirectory {
    fn page(&self, cursor: Option<&str>) -> Result<GroupPage>;
}

/// Drain the directory into a full ordered group list.
pub fn collect_groups(directory: &dyn GroupDirectory) -> Result<Vec<Group>> {
    let mut groups = Vec::new();
    let mut cursor: Option<String> = None;

    for page_no in 0.. {
        if page_no >= MAX_PAGES {
            return Err(AuditError::PagingRunaway(MAX_PAGES));
        }

        let page = directory.page(cursor.as_deref())?;
        debug!(page = page_no, groups = page.groups.len(), "directory page fetched");
        groups.extend(page.groups);

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(groups)
}

/// Turn a group list into the batch job's ordered work items.
pub fn roster_items(groups: &[Group]) -> Vec<WorkItem> {
    groups
        .iter()
        .map(|g| WorkItem::new(g.key.clone(), g.display_name.clone()))
        .collect()
}

/// In-memory directory for testing: fixed pages keyed by cursor.
#[derive(Debug, Default)]
pub struct MockGroupDirectory {
    pages: Vec<GroupPage>,
    failing: bool,
}

impl MockGroupDirectory {
    /// Split `groups` into pages of `page_size`.
    pub fn paged(groups: Vec<Group>, page_size: usize) -> Self {
        let chunks: Vec<Vec<Group>> = groups
            .chunks(page_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        let total = chunks.len();
        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, groups)| GroupPage {
                groups,
                next: (i + 1 < total).then(|| format!("page-{}", i + 1)),
            })
            .collect();
        Self {
            pages,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            pages: Vec::new(),
            failing: true,
        }
    }
}

impl GroupDirectory for MockGroupDirectory {
    fn page(&self, cursor: Option<&str>) -> Result<GroupPage> {
        if self.failing {
            return Err(AuditError::Directory("injected failure".to_string()));
        }

        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| AuditError::Directory(format!("bad cursor: {c}")))?,
        };

        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| AuditError::Directory(format!("no page at {index}")))
    }
}
