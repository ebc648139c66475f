//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods; nothing else executes SQL.

use crate::{error::SimResult, event::EventLogEntry};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SimStore {
    conn: Connection,
}

/// One row of the run table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_id: String,
    pub seed: u64,
    pub campaign_id: String,
    pub version: String,
    pub started_at: String,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_campaign.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: u64,
        campaign_id: &str,
        version: &str,
        started_at: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, campaign_id, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, campaign_id, version, started_at],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> SimResult<Option<RunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT run_id, seed, campaign_id, version, started_at FROM run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        run_id: row.get(0)?,
                        seed: row.get::<_, i64>(1)? as u64,
                        campaign_id: row.get(2)?,
                        version: row.get(3)?,
                        started_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, day, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                i64::from(entry.day),
                entry.source,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_day(&self, run_id: &str, day: u32) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, day, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, i64::from(day)], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Every event of a run in insertion order.
    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, day, source, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, day: u32, state_json: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO snapshot (run_id, day, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, i64::from(day), state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot_before(
        &self,
        run_id: &str,
        day: u32,
    ) -> SimResult<Option<(u32, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT day, state_json FROM snapshot
                 WHERE run_id = ?1 AND day <= ?2
                 ORDER BY day DESC, id DESC LIMIT 1",
                params![run_id, i64::from(day)],
                |row| Ok((row.get::<_, i64>(0)? as u32, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventLogEntry> {
    Ok(EventLogEntry {
        id: Some(row.get(0)?),
        run_id: row.get(1)?,
        day: row.get::<_, i64>(2)? as u32,
        source: row.get(3)?,
        event_type: row.get(4)?,
        payload: row.get(5)?,
    })
}
