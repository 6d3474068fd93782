#![forbid(unsafe_code)]

use super::{VersionedGraphCollection, apply_record, replace_graph};
use crate::store::{LogTable, StoreError};
use tracing::info;
use vg_core::TripleStore;
use vg_core::history::Version;

impl<S: TripleStore> VersionedGraphCollection<S> {
    /// Reverts the latest committed changeset and parks its rows in the redo
    /// log. Fails with `NoHistory` when the active log is empty.
    pub fn undo(&mut self) -> Result<Version, StoreError> {
        let Some(latest) = self.log.latest_version()? else {
            return Err(StoreError::NoHistory(LogTable::Active));
        };

        let before = self.log.timestamp_before(latest.timestamp)?;
        let mut working = self.store.graph_copy(&latest.graph);
        self.reconstruct(&mut working, before, Some(&latest.graph))?;

        let moved = self
            .log
            .move_changeset(&latest.changeset_id, LogTable::Active, LogTable::Redo)?;
        replace_graph(&mut self.store, &latest.graph, &working);

        info!(
            changeset = %latest.changeset_id,
            graph = %latest.graph,
            seq = latest.timestamp.seq,
            restored_to = %before,
            rows = moved,
            "changeset undone"
        );
        Ok(latest)
    }

    /// Re-applies the most recently undone changeset.
    ///
    /// Refuses when a newer changeset was committed after the undo, since
    /// replaying the older one on top would break the log's ordering.
    pub fn redo(&mut self) -> Result<Version, StoreError> {
        let Some(head) = self.log.redo_head()? else {
            return Err(StoreError::NoHistory(LogTable::Redo));
        };
        if let Some(latest) = self.log.latest_version()? {
            if latest.timestamp.seq > head.timestamp.seq {
                return Err(StoreError::RedoSuperseded {
                    changeset_id: head.changeset_id.to_string(),
                    redo_seq: head.timestamp.seq,
                    latest_seq: latest.timestamp.seq,
                });
            }
        }

        let rows = self.log.changeset_rows(&head.changeset_id, LogTable::Redo)?;
        self.log
            .move_changeset(&head.changeset_id, LogTable::Redo, LogTable::Active)?;
        for record in &rows {
            apply_record(&mut self.store, record);
        }

        info!(
            changeset = %head.changeset_id,
            graph = %head.graph,
            seq = head.timestamp.seq,
            rows = rows.len(),
            "changeset redone"
        );
        Ok(head)
    }

    /// Forgets every undone changeset so new history can be built without
    /// redo conflicts. Returns the number of rows dropped.
    pub fn discard_redo(&mut self) -> Result<usize, StoreError> {
        let dropped = self.log.discard_redo()?;
        if dropped > 0 {
            info!(rows = dropped, "redo log discarded");
        }
        Ok(dropped)
    }
}
