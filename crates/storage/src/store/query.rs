#![forbid(unsafe_code)]

use super::support::{RawRow, ROW_COLUMNS, decode_graph, decode_version, version_from_row};
use super::{ChangeRecord, DeltaLog, LogTable, StoreError};
use rusqlite::{OptionalExtension, params};
use vg_core::history::{Timestamp, Version};
use vg_core::ids::{ChangesetId, GraphName};

// Rows parked without a stack entry sort below every recorded undo.
const REDO_ORDER_KEY: &str = "COALESCE(s.undo_seq, 0)";

impl DeltaLog {
    /// Active rows newer than `timestamp`, newest first. Rows of one changeset
    /// come out in reverse application order, so inverting them in sequence
    /// walks history backwards.
    pub fn rows_since(
        &self,
        timestamp: Timestamp,
        graph: Option<&GraphName>,
    ) -> Result<Vec<ChangeRecord>, StoreError> {
        let raw = match graph {
            Some(graph) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ROW_COLUMNS} FROM changesets \
                     WHERE graph=?1 AND seq > ?2 \
                     ORDER BY seq DESC, ord DESC"
                ))?;
                let rows = stmt.query_map(params![graph.as_str(), timestamp.seq], RawRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ROW_COLUMNS} FROM changesets \
                     WHERE seq > ?1 \
                     ORDER BY seq DESC, ord DESC"
                ))?;
                let rows = stmt.query_map(params![timestamp.seq], RawRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        raw.into_iter().map(RawRow::into_record).collect()
    }

    /// Every active row in application order; used to rebuild live graphs.
    pub fn active_rows(&self) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM changesets ORDER BY seq ASC, ord ASC"
        ))?;
        let rows = stmt.query_map([], RawRow::from_row)?;
        let raw = rows.collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_record).collect()
    }

    /// Rows of one changeset in their stored (application) order.
    pub fn changeset_rows(
        &self,
        changeset_id: &ChangesetId,
        table: LogTable,
    ) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM {} WHERE id=?1 ORDER BY ord ASC",
            table.as_str()
        ))?;
        let rows = stmt.query_map(params![changeset_id.as_str()], RawRow::from_row)?;
        let raw = rows.collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_record).collect()
    }

    /// Latest active timestamp strictly before `timestamp`, or
    /// `Timestamp::ORIGIN` when nothing precedes it.
    pub fn timestamp_before(&self, timestamp: Timestamp) -> Result<Timestamp, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT seq, ts_ms FROM changesets WHERE seq < ?1 ORDER BY seq DESC LIMIT 1",
                params![timestamp.seq],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row
            .map(|(seq, wall_ms)| Timestamp::new(seq, wall_ms))
            .unwrap_or(Timestamp::ORIGIN))
    }

    /// Latest active timestamp whose wall-clock time is at or before `wall_ms`.
    pub fn timestamp_at_wall_clock(&self, wall_ms: i64) -> Result<Timestamp, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT seq, ts_ms FROM changesets WHERE ts_ms <= ?1 ORDER BY seq DESC LIMIT 1",
                params![wall_ms],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row
            .map(|(seq, wall_ms)| Timestamp::new(seq, wall_ms))
            .unwrap_or(Timestamp::ORIGIN))
    }

    pub fn latest_version(&self) -> Result<Option<Version>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, graph, seq, ts_ms FROM changesets ORDER BY seq DESC LIMIT 1",
                [],
                version_from_row,
            )
            .optional()?;
        row.map(decode_version).transpose()
    }

    /// Committed versions, most recent first.
    pub fn versions(&self, graph: Option<&GraphName>) -> Result<Vec<Version>, StoreError> {
        let raw = match graph {
            Some(graph) => {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT id, graph, seq, ts_ms FROM changesets \
                     WHERE graph=?1 ORDER BY seq DESC",
                )?;
                let rows = stmt.query_map(params![graph.as_str()], version_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT id, graph, seq, ts_ms FROM changesets ORDER BY seq DESC",
                )?;
                let rows = stmt.query_map([], version_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        raw.into_iter().map(decode_version).collect()
    }

    /// Undone changesets, head (most recently undone) first.
    pub fn redo_versions(&self) -> Result<Vec<Version>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT r.id, r.graph, r.seq, r.ts_ms, {REDO_ORDER_KEY} AS undo_seq \
             FROM redos r LEFT JOIN redo_stack s ON s.id = r.id \
             ORDER BY undo_seq DESC, r.seq ASC"
        ))?;
        let rows = stmt.query_map([], version_from_row)?;
        let raw = rows.collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(decode_version).collect()
    }

    /// The changeset `redo` would re-apply: the most recently undone one.
    pub fn redo_head(&self) -> Result<Option<Version>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT r.id, r.graph, r.seq, r.ts_ms FROM redos r \
                     LEFT JOIN redo_stack s ON s.id = r.id \
                     ORDER BY {REDO_ORDER_KEY} DESC, r.seq ASC LIMIT 1"
                ),
                [],
                version_from_row,
            )
            .optional()?;
        row.map(decode_version).transpose()
    }

    /// Graphs touched by active rows newer than `timestamp`.
    pub fn graphs_since(&self, timestamp: Timestamp) -> Result<Vec<GraphName>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT graph FROM changesets WHERE seq > ?1 ORDER BY graph ASC")?;
        let rows = stmt.query_map(params![timestamp.seq], |row| row.get::<_, String>(0))?;
        let raw = rows.collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(decode_graph).collect()
    }

    pub fn row_count(&self, table: LogTable) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(1) FROM {}", table.as_str()),
            [],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| StoreError::CorruptRow("negative row count"))
    }
}
