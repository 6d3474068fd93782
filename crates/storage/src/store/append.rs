#![forbid(unsafe_code)]

use super::support::{
    allocate_timestamp_tx, count_rows_tx, insert_row_tx, observe_timestamp_tx, pin_timestamp_tx,
};
use super::{ChangeRecord, DeltaLog, LogTable, StoreError};
use rusqlite::{OptionalExtension, Transaction, params};
use vg_core::Triple;
use vg_core::history::{Operation, Timestamp, Version};
use vg_core::ids::{ChangesetId, GraphName};

impl DeltaLog {
    /// Writes a single row to the active log in its own transaction.
    ///
    /// The row takes the next free ordinal of its changeset. The timestamp
    /// must not precede the latest version, and may only equal it when the
    /// row extends that same changeset.
    pub fn append(
        &mut self,
        changeset_id: &ChangesetId,
        timestamp: Timestamp,
        graph: &GraphName,
        operation: Operation,
        triple: &Triple,
    ) -> Result<ChangeRecord, StoreError> {
        if timestamp.seq <= 0 {
            return Err(StoreError::InvalidInput("timestamp seq must be positive"));
        }

        let tx = self.conn.transaction()?;

        if let Some((latest_id, latest_seq)) = latest_active_tx(&tx)? {
            let extends_latest = latest_id == changeset_id.as_str() && latest_seq == timestamp.seq;
            if timestamp.seq < latest_seq || (timestamp.seq == latest_seq && !extends_latest) {
                return Err(StoreError::TimestampRegression {
                    seq: timestamp.seq,
                    latest_seq,
                });
            }
        }
        if count_rows_tx(&tx, LogTable::Redo, changeset_id.as_str())? > 0 {
            return Err(StoreError::DestinationOccupied {
                changeset_id: changeset_id.to_string(),
                table: LogTable::Redo,
            });
        }
        let recorded: Option<(i64, String)> = tx
            .query_row(
                "SELECT seq, graph FROM changesets WHERE id=?1 LIMIT 1",
                params![changeset_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((seq, recorded_graph)) = recorded {
            if seq != timestamp.seq {
                return Err(StoreError::InvalidInput(
                    "changeset id already recorded at another timestamp",
                ));
            }
            if recorded_graph != graph.as_str() {
                return Err(StoreError::InvalidInput(
                    "changeset id already recorded against another graph",
                ));
            }
        }

        let ordinal: i64 = tx.query_row(
            "SELECT COALESCE(MAX(ord) + 1, 0) FROM changesets WHERE id=?1",
            params![changeset_id.as_str()],
            |row| row.get(0),
        )?;

        let record = ChangeRecord {
            changeset_id: changeset_id.clone(),
            timestamp,
            ordinal,
            graph: graph.clone(),
            operation,
            triple: triple.clone(),
        };
        insert_row_tx(&tx, LogTable::Active, &record)?;
        observe_timestamp_tx(&tx, timestamp)?;

        tx.commit()?;
        Ok(record)
    }

    /// Records one changeset atomically.
    ///
    /// Deletions take the first ordinals, additions follow, which is the order
    /// they are applied to the live graph. `precommit` runs inside the same
    /// transaction after every row is written; if it fails, nothing is kept.
    pub fn commit_changeset<F>(
        &mut self,
        changeset_id: &ChangesetId,
        graph: &GraphName,
        deletions: &[Triple],
        additions: &[Triple],
        precommit: F,
    ) -> Result<Version, StoreError>
    where
        F: FnOnce(&Version) -> Result<(), StoreError>,
    {
        self.commit_changeset_at(changeset_id, graph, None, deletions, additions, precommit)
    }

    /// `commit_changeset` with an optional caller-chosen timestamp. A pinned
    /// timestamp must follow every `seq` already allocated, undone changesets
    /// included; `None` allocates the next one.
    pub fn commit_changeset_at<F>(
        &mut self,
        changeset_id: &ChangesetId,
        graph: &GraphName,
        timestamp: Option<Timestamp>,
        deletions: &[Triple],
        additions: &[Triple],
        precommit: F,
    ) -> Result<Version, StoreError>
    where
        F: FnOnce(&Version) -> Result<(), StoreError>,
    {
        if deletions.is_empty() && additions.is_empty() {
            return Err(StoreError::InvalidInput("changeset has no operations"));
        }

        let tx = self.conn.transaction()?;
        for table in [LogTable::Active, LogTable::Redo] {
            if count_rows_tx(&tx, table, changeset_id.as_str())? > 0 {
                return Err(StoreError::DestinationOccupied {
                    changeset_id: changeset_id.to_string(),
                    table,
                });
            }
        }

        let timestamp = match timestamp {
            Some(timestamp) => pin_timestamp_tx(&tx, timestamp)?,
            None => allocate_timestamp_tx(&tx)?,
        };
        let operations = deletions
            .iter()
            .map(|triple| (Operation::Delete, triple))
            .chain(additions.iter().map(|triple| (Operation::Insert, triple)));
        for (ordinal, (operation, triple)) in operations.enumerate() {
            let ordinal = i64::try_from(ordinal)
                .map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
            insert_row_tx(
                &tx,
                LogTable::Active,
                &ChangeRecord {
                    changeset_id: changeset_id.clone(),
                    timestamp,
                    ordinal,
                    graph: graph.clone(),
                    operation,
                    triple: triple.clone(),
                },
            )?;
        }

        let version = Version {
            changeset_id: changeset_id.clone(),
            graph: graph.clone(),
            timestamp,
        };
        precommit(&version)?;

        tx.commit()?;
        Ok(version)
    }
}

fn latest_active_tx(tx: &Transaction<'_>) -> Result<Option<(String, i64)>, StoreError> {
    Ok(tx
        .query_row(
            "SELECT id, seq FROM changesets ORDER BY seq DESC, ord DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?)
}
