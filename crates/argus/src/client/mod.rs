//! HTTP adapters for the external collaborator ports.
//!
//! One blocking client serves the activity feed, metadata lookup, group
//! directory and shared-item search against the drive-like REST API; a
//! separate webhook client delivers notifications. Per-call errors map into
//! each port's own taxonomy so the cores never see transport shapes.

use argus_audit::{Group, GroupDirectory, GroupPage, SearchError, SharedItem, SharedItemSearch};
use argus_collector::{ActivityFeed, FeedError, Notifier, NotifyError, RawAction};
use argus_resolver::{LookupError, MetadataLookup, PathNode};
use argus_types::ChangeEvent;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request timeout for all drive API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Response types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct FileMetadataResponse {
    id: String,
    name: String,
    #[serde(default)]
    parent_ids: Vec<String>,
    #[serde(default)]
    container_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    key: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    #[serde(default)]
    groups: Vec<GroupRow>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedItemRow {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SharedResponse {
    #[serde(default)]
    items: Vec<SharedItemRow>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Drive API client
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking client for the drive-like REST API.
pub struct DriveApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl DriveApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiCallError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "drive API request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| ApiCallError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiCallError::NotFound),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(ApiCallError::Denied),
            status if !status.is_success() => {
                Err(ApiCallError::Transport(format!("HTTP {status} from {url}")))
            }
            _ => response
                .json::<T>()
                .map_err(|e| ApiCallError::Transport(format!("bad response body: {e}"))),
        }
    }
}

/// Internal transport-level error, mapped per port below.
#[derive(Debug)]
enum ApiCallError {
    NotFound,
    Denied,
    Transport(String),
}

impl std::fmt::Display for ApiCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCallError::NotFound => write!(f, "not found"),
            ApiCallError::Denied => write!(f, "permission denied"),
            ApiCallError::Transport(reason) => write!(f, "{reason}"),
        }
    }
}

impl ActivityFeed for DriveApiClient {
    fn changes_since(
        &self,
        subtree_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawAction>, FeedError> {
        let since_str = since.to_rfc3339();
        let response: ActivityResponse = self
            .get_json(
                "/activity",
                &[
                    ("subtree", subtree_id),
                    ("kind", "permission-change"),
                    ("since", since_str.as_str()),
                ],
            )
            .map_err(|e| FeedError(e.to_string()))?;
        Ok(response.actions)
    }
}

impl MetadataLookup for DriveApiClient {
    fn metadata(&self, id: &str) -> Result<PathNode, LookupError> {
        let response: FileMetadataResponse = self
            .get_json(&format!("/files/{id}"), &[])
            .map_err(|e| match e {
                ApiCallError::NotFound => LookupError::NotFound(id.to_string()),
                ApiCallError::Denied => LookupError::PermissionDenied(id.to_string()),
                ApiCallError::Transport(reason) => LookupError::Backend(reason),
            })?;
        Ok(PathNode {
            id: response.id,
            name: response.name,
            parent_ids: response.parent_ids,
            container_id: response.container_id,
        })
    }

    fn container_name(&self, container_id: &str) -> Result<String, LookupError> {
        let response: ContainerResponse = self
            .get_json(&format!("/containers/{container_id}"), &[])
            .map_err(|e| match e {
                ApiCallError::NotFound => LookupError::NotFound(container_id.to_string()),
                ApiCallError::Denied => LookupError::PermissionDenied(container_id.to_string()),
                ApiCallError::Transport(reason) => LookupError::Backend(reason),
            })?;
        Ok(response.name)
    }
}

impl GroupDirectory for DriveApiClient {
    fn page(&self, cursor: Option<&str>) -> argus_audit::Result<GroupPage> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(c) = cursor {
            query.push(("cursor", c));
        }
        let response: GroupsResponse = self
            .get_json("/groups", &query)
            .map_err(|e| argus_audit::AuditError::Directory(e.to_string()))?;
        Ok(GroupPage {
            groups: response
                .groups
                .into_iter()
                .map(|g| Group {
                    display_name: if g.display_name.is_empty() {
                        g.key.clone()
                    } else {
                        g.display_name
                    },
                    key: g.key,
                })
                .collect(),
            next: response.next_cursor,
        })
    }
}

impl SharedItemSearch for DriveApiClient {
    fn shared_with(&self, principal: &str) -> Result<Vec<SharedItem>, SearchError> {
        let response: SharedResponse = self
            .get_json("/shared", &[("principal", principal)])
            .map_err(|e| SearchError(e.to_string()))?;
        Ok(response
            .items
            .into_iter()
            .map(|i| SharedItem {
                id: i.id,
                name: i.name,
            })
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook notifier
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

/// Posts formatted change events to a chat webhook.
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

/// One-line chat rendering of a change event.
pub fn format_event(event: &ChangeEvent) -> String {
    format!(
        "Permission {} on \"{}\": {} {} as {} (by {}, {})",
        event.kind,
        event.target_name,
        event.entity.kind,
        event.entity.identifier,
        event.role,
        event.actor,
        event.when.format("%Y-%m-%d %H:%M UTC"),
    )
}

impl Notifier for WebhookNotifier {
    fn deliver(&self, event: &ChangeEvent, target: Option<&str>) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            text: format_event(event),
            channel: target,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError(format!("HTTP {}", response.status())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_types::{ChangeKind, Entity, EntityKind};
    use chrono::TimeZone;

    #[test]
    fn format_event_reads_as_one_line() {
        let event = ChangeEvent {
            target_id: "t1".into(),
            target_name: "Budget 2026".into(),
            kind: ChangeKind::Added,
            entity: Entity::new(EntityKind::User, "alice@example.com"),
            role: "writer".into(),
            actor: "admin@example.com".into(),
            when: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        };

        let line = format_event(&event);
        assert_eq!(
            line,
            "Permission added on \"Budget 2026\": user alice@example.com as writer (by admin@example.com, 2026-03-01 12:30 UTC)"
        );
    }
}
