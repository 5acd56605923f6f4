use std::path::Path;
use std::sync::Mutex;

use argus_types::{ItemState, RunState, WorkItem};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::storage::{
    AuditReportSink, AuditRow, BatchJob, ItemStatusRow, JobStore, StatusSink, WatermarkStore,
};
use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// SQLite-backed implementation of every argus storage port.
///
/// Thread-safe via internal `Mutex<Connection>`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&mut self) -> Result<()> {
        let conn = self.conn.get_mut().unwrap();
        embedded::migrations::runner()
            .run(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Lock the connection for use. Panics if poisoned.
    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ── Display queries ─────────────────────────────────────────────

    /// All status rows, most recently updated first.
    pub fn statuses(&self) -> Result<Vec<ItemStatusRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT item_key, label, status, detail, updated_at
             FROM item_status ORDER BY updated_at DESC, item_key",
        )?;
        let iter = stmt.query_map([], row_to_status)?;
        let mut rows = Vec::new();
        for r in iter {
            rows.push(r?);
        }
        Ok(rows)
    }

    /// Report rows for one group, in insertion order.
    pub fn group_rows(&self, group_key: &str) -> Result<Vec<AuditRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT group_key, item_id, item_name, path, depth, container
             FROM audit_rows WHERE group_key = ?1 ORDER BY id",
        )?;
        let iter = stmt.query_map(params![group_key], row_to_audit)?;
        let mut rows = Vec::new();
        for r in iter {
            rows.push(r?);
        }
        Ok(rows)
    }
}

impl WatermarkStore for SqliteStore {
    fn last_seen(&self, resource_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT last_seen FROM watermarks WHERE resource_id = ?1",
                params![resource_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|s| parse_dt(&s)))
    }

    fn advance(&self, resource_id: &str, to: DateTime<Utc>) -> Result<()> {
        // Monotone: keep the newer of the stored and supplied timestamps.
        self.conn().execute(
            "INSERT INTO watermarks (resource_id, last_seen) VALUES (?1, ?2)
             ON CONFLICT(resource_id) DO UPDATE SET last_seen = excluded.last_seen
             WHERE excluded.last_seen > watermarks.last_seen",
            params![resource_id, to.to_rfc3339()],
        )?;
        Ok(())
    }
}

impl JobStore for SqliteStore {
    fn begin(&self, items: &[WorkItem]) -> Result<BatchJob> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing: Option<(String, String)> = tx
            .query_row(
                "SELECT run_id, state FROM batch_job WHERE slot = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((run_id, state)) = existing
            && state == RunState::Running.to_string()
        {
            return Err(StoreError::SlotBusy(run_id));
        }

        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let run_id = uuid::Uuid::new_v4().to_string();
        let items_json = serde_json::to_string(items)?;

        tx.execute(
            "INSERT OR REPLACE INTO batch_job
                 (slot, run_id, items, cursor, state, created_at, updated_at)
             VALUES (1, ?1, ?2, 0, ?3, ?4, ?4)",
            params![run_id, items_json, RunState::Running.to_string(), now_str],
        )?;
        tx.commit()?;

        Ok(BatchJob {
            run_id,
            items: items.to_vec(),
            cursor: 0,
            state: RunState::Running,
            created_at: now,
            updated_at: now,
        })
    }

    fn load(&self) -> Result<Option<BatchJob>> {
        let row: Option<(String, String, i64, String, String, String)> = self
            .conn()
            .query_row(
                "SELECT run_id, items, cursor, state, created_at, updated_at
                 FROM batch_job WHERE slot = 1",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((run_id, items_json, cursor, state, created_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(BatchJob {
            run_id,
            items: serde_json::from_str(&items_json)?,
            cursor: cursor.max(0) as usize,
            state: parse_run_state(&state),
            created_at: parse_dt(&created_at),
            updated_at: parse_dt(&updated_at),
        }))
    }

    fn advance_cursor(&self, run_id: &str, cursor: usize) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE batch_job SET cursor = ?1, updated_at = ?2 WHERE slot = 1 AND run_id = ?3",
            params![cursor as i64, Utc::now().to_rfc3339(), run_id],
        )?;
        if updated == 0 {
            warn!(run_id, cursor, "cursor advance hit no matching job slot");
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn()
            .execute("DELETE FROM batch_job WHERE slot = 1", [])?;
        Ok(())
    }
}

impl StatusSink for SqliteStore {
    fn set_status(
        &self,
        item: &WorkItem,
        state: ItemState,
        detail: Option<&str>,
        when: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO item_status (item_key, label, status, detail, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.key,
                item.label,
                state.to_string(),
                detail,
                when.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.conn().execute("DELETE FROM item_status", [])?;
        Ok(())
    }
}

impl AuditReportSink for SqliteStore {
    fn replace_group_rows(&self, group_key: &str, rows: &[AuditRow]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM audit_rows WHERE group_key = ?1",
            params![group_key],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO audit_rows
                     (group_key, item_id, item_name, path, depth, container, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let now_str = Utc::now().to_rfc3339();
            for row in rows {
                stmt.execute(params![
                    group_key,
                    row.item_id,
                    row.item_name,
                    row.path,
                    row.depth as i64,
                    row.container,
                    now_str
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_run_state(s: &str) -> RunState {
    match s {
        "running" => RunState::Running,
        "canceled" => RunState::Canceled,
        _ => RunState::Idle,
    }
}

fn parse_item_state(s: &str) -> ItemState {
    match s {
        "done" => ItemState::Done,
        "failed" => ItemState::Failed,
        "canceled" => ItemState::Canceled,
        _ => ItemState::Pending,
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemStatusRow> {
    Ok(ItemStatusRow {
        key: row.get(0)?,
        label: row.get(1)?,
        state: parse_item_state(&row.get::<_, String>(2)?),
        detail: row.get(3)?,
        updated_at: parse_dt(&row.get::<_, String>(4)?),
    })
}

fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditRow> {
    Ok(AuditRow {
        group_key: row.get(0)?,
        item_id: row.get(1)?,
        item_name: row.get(2)?,
        path: row.get(3)?,
        depth: row.get::<_, i64>(4)?.max(0) as usize,
        container: row.get(5)?,
    })
}
