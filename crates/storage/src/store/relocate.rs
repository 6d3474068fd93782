#![forbid(unsafe_code)]

use super::support::{ROW_COLUMNS, count_rows_tx, next_undo_seq_tx};
use super::{DeltaLog, LogTable, StoreError};
use rusqlite::params;
use vg_core::ids::ChangesetId;

impl DeltaLog {
    /// Moves every row of a changeset from one table to the other in a single
    /// transaction. Row content, ordinals and timestamps are kept as-is.
    ///
    /// A changeset moved into the redo log goes on top of the redo stack, so
    /// `redo_head` always names the most recently undone changeset.
    pub fn move_changeset(
        &mut self,
        changeset_id: &ChangesetId,
        from: LogTable,
        to: LogTable,
    ) -> Result<usize, StoreError> {
        if from == to {
            return Err(StoreError::InvalidInput("move source and destination are the same"));
        }

        let tx = self.conn.transaction()?;
        if count_rows_tx(&tx, to, changeset_id.as_str())? > 0 {
            return Err(StoreError::DestinationOccupied {
                changeset_id: changeset_id.to_string(),
                table: to,
            });
        }

        let copied = tx.execute(
            &format!(
                "INSERT INTO {to}({ROW_COLUMNS}) SELECT {ROW_COLUMNS} FROM {from} WHERE id=?1",
                to = to.as_str(),
                from = from.as_str(),
            ),
            params![changeset_id.as_str()],
        )?;
        if copied == 0 {
            return Err(StoreError::UnknownChangeset {
                changeset_id: changeset_id.to_string(),
                table: from,
            });
        }

        let deleted = tx.execute(
            &format!("DELETE FROM {} WHERE id=?1", from.as_str()),
            params![changeset_id.as_str()],
        )?;
        if deleted != copied {
            return Err(StoreError::CorruptRow("moved row count mismatch"));
        }

        match to {
            LogTable::Redo => {
                let undo_seq = next_undo_seq_tx(&tx)?;
                tx.execute(
                    "INSERT INTO redo_stack(id, undo_seq) VALUES (?1, ?2)",
                    params![changeset_id.as_str(), undo_seq],
                )?;
            }
            LogTable::Active => {
                tx.execute(
                    "DELETE FROM redo_stack WHERE id=?1",
                    params![changeset_id.as_str()],
                )?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            changeset = %changeset_id,
            from = from.as_str(),
            to = to.as_str(),
            rows = copied,
            "changeset moved"
        );
        Ok(copied)
    }

    /// Drops every undone changeset. This is the only operation that removes
    /// rows from the log.
    pub fn discard_redo(&mut self) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM redos", [])?;
        tx.execute("DELETE FROM redo_stack", [])?;
        tx.commit()?;
        Ok(deleted)
    }
}
