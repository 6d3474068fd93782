#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{Connection, params};

const LOG_SCHEMA_VERSION: &str = "1";

// `changesets` is the active log, `redos` holds undone changesets. The two
// tables must stay column-for-column identical so rows move with INSERT ... SELECT.
const SQL: &str = r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS changesets (
          id TEXT NOT NULL,
          seq INTEGER NOT NULL,
          ts_ms INTEGER NOT NULL,
          ord INTEGER NOT NULL,
          graph TEXT NOT NULL,
          is_insertion INTEGER NOT NULL,
          triple TEXT NOT NULL,
          PRIMARY KEY (id, ord)
        );

        CREATE TABLE IF NOT EXISTS redos (
          id TEXT NOT NULL,
          seq INTEGER NOT NULL,
          ts_ms INTEGER NOT NULL,
          ord INTEGER NOT NULL,
          graph TEXT NOT NULL,
          is_insertion INTEGER NOT NULL,
          triple TEXT NOT NULL,
          PRIMARY KEY (id, ord)
        );

        -- One row per changeset parked in `redos`; `undo_seq` orders them by
        -- when they were undone, newest undo on top.
        CREATE TABLE IF NOT EXISTS redo_stack (
          id TEXT PRIMARY KEY,
          undo_seq INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_changesets_graph_seq ON changesets(graph, seq);
        CREATE INDEX IF NOT EXISTS idx_changesets_seq ON changesets(seq, ord);
        CREATE INDEX IF NOT EXISTS idx_redos_seq ON redos(seq, ord);
"#;

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["log_schema_version", LOG_SCHEMA_VERSION],
    )?;

    Ok(())
}
