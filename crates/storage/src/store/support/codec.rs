#![forbid(unsafe_code)]

use super::super::{ChangeRecord, LogTable, StoreError};
use rusqlite::{Row, Transaction, params};
use vg_core::Triple;
use vg_core::history::{Operation, Timestamp, Version};
use vg_core::ids::{ChangesetId, GraphName};

pub(in crate::store) const ROW_COLUMNS: &str = "id, seq, ts_ms, ord, graph, is_insertion, triple";

/// A log row as stored, before identifiers and the triple are decoded.
pub(in crate::store) struct RawRow {
    id: String,
    seq: i64,
    ts_ms: i64,
    ord: i64,
    graph: String,
    is_insertion: bool,
    triple_json: String,
}

impl RawRow {
    /// Expects the columns in `ROW_COLUMNS` order.
    pub(in crate::store) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            seq: row.get(1)?,
            ts_ms: row.get(2)?,
            ord: row.get(3)?,
            graph: row.get(4)?,
            is_insertion: row.get(5)?,
            triple_json: row.get(6)?,
        })
    }

    pub(in crate::store) fn into_record(self) -> Result<ChangeRecord, StoreError> {
        let triple: Triple = serde_json::from_str(&self.triple_json)?;
        Ok(ChangeRecord {
            changeset_id: decode_changeset_id(self.id)?,
            timestamp: Timestamp::new(self.seq, self.ts_ms),
            ordinal: self.ord,
            graph: decode_graph(self.graph)?,
            operation: Operation::from_insertion(self.is_insertion),
            triple,
        })
    }
}

pub(in crate::store) fn decode_changeset_id(value: String) -> Result<ChangesetId, StoreError> {
    ChangesetId::try_new(value).map_err(|_| StoreError::CorruptRow("invalid changeset id"))
}

pub(in crate::store) fn decode_graph(value: String) -> Result<GraphName, StoreError> {
    GraphName::try_new(value).map_err(|_| StoreError::CorruptRow("invalid graph name"))
}

/// Maps `id, graph, seq, ts_ms` columns.
pub(in crate::store) fn version_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<(String, String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

pub(in crate::store) fn decode_version(
    (id, graph, seq, ts_ms): (String, String, i64, i64),
) -> Result<Version, StoreError> {
    Ok(Version {
        changeset_id: decode_changeset_id(id)?,
        graph: decode_graph(graph)?,
        timestamp: Timestamp::new(seq, ts_ms),
    })
}

pub(in crate::store) fn insert_row_tx(
    tx: &Transaction<'_>,
    table: LogTable,
    record: &ChangeRecord,
) -> Result<(), StoreError> {
    let triple_json = serde_json::to_string(&record.triple)?;
    let sql = format!(
        "INSERT INTO {}({ROW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        table.as_str()
    );
    tx.execute(
        &sql,
        params![
            record.changeset_id.as_str(),
            record.timestamp.seq,
            record.timestamp.wall_ms,
            record.ordinal,
            record.graph.as_str(),
            record.operation.is_insertion(),
            triple_json,
        ],
    )?;
    Ok(())
}

pub(in crate::store) fn count_rows_tx(
    tx: &Transaction<'_>,
    table: LogTable,
    changeset_id: &str,
) -> Result<i64, StoreError> {
    let sql = format!("SELECT COUNT(1) FROM {} WHERE id=?1", table.as_str());
    Ok(tx.query_row(&sql, params![changeset_id], |row| row.get(0))?)
}
