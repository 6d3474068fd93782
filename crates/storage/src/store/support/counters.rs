#![forbid(unsafe_code)]

use super::super::StoreError;
use super::now_ms;
use rusqlite::{OptionalExtension, Transaction, params};
use vg_core::history::Timestamp;

const SEQ_COUNTER: &str = "changeset_seq";
const WALL_COUNTER: &str = "wall_ms";
const UNDO_COUNTER: &str = "undo_seq";

fn counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    Ok(tx
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

fn raise_counter_tx(tx: &Transaction<'_>, name: &str, value: i64) -> Result<(), StoreError> {
    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=MAX(value, excluded.value)
        "#,
        params![name, value],
    )?;
    Ok(())
}

/// Hands out the next `(seq, wall_ms)` pair. `seq` strictly increases and is
/// never reused, even after its changeset moves to the redo log.
pub(in crate::store) fn allocate_timestamp_tx(
    tx: &Transaction<'_>,
) -> Result<Timestamp, StoreError> {
    let seq = counter_tx(tx, SEQ_COUNTER)? + 1;
    let wall_ms = now_ms().max(counter_tx(tx, WALL_COUNTER)?);
    raise_counter_tx(tx, SEQ_COUNTER, seq)?;
    raise_counter_tx(tx, WALL_COUNTER, wall_ms)?;
    Ok(Timestamp::new(seq, wall_ms))
}

/// Accepts a caller-chosen timestamp for a new changeset. It must come after
/// every `seq` ever handed out and must not move the wall clock backwards.
pub(in crate::store) fn pin_timestamp_tx(
    tx: &Transaction<'_>,
    timestamp: Timestamp,
) -> Result<Timestamp, StoreError> {
    let latest_seq = counter_tx(tx, SEQ_COUNTER)?;
    if timestamp.seq <= latest_seq {
        return Err(StoreError::TimestampRegression {
            seq: timestamp.seq,
            latest_seq,
        });
    }
    if timestamp.wall_ms < counter_tx(tx, WALL_COUNTER)? {
        return Err(StoreError::InvalidInput(
            "timestamp wall clock precedes the latest commit",
        ));
    }
    observe_timestamp_tx(tx, timestamp)?;
    Ok(timestamp)
}

/// Keeps the counters ahead of a caller-supplied timestamp.
pub(in crate::store) fn observe_timestamp_tx(
    tx: &Transaction<'_>,
    timestamp: Timestamp,
) -> Result<(), StoreError> {
    raise_counter_tx(tx, SEQ_COUNTER, timestamp.seq)?;
    raise_counter_tx(tx, WALL_COUNTER, timestamp.wall_ms)?;
    Ok(())
}

/// Next position on the redo stack. Strictly increases across the log's life.
pub(in crate::store) fn next_undo_seq_tx(tx: &Transaction<'_>) -> Result<i64, StoreError> {
    let undo_seq = counter_tx(tx, UNDO_COUNTER)? + 1;
    raise_counter_tx(tx, UNDO_COUNTER, undo_seq)?;
    Ok(undo_seq)
}
