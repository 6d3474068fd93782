#![forbid(unsafe_code)]

use super::LogTable;
use crate::hooks::HookError;

/// Coarse classification of a [`StoreError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backing store unreachable or corrupt.
    Storage,
    /// Undo or redo attempted with an empty log.
    NoHistory,
    /// Malformed request; nothing was changed.
    Validation,
    /// A registered hook failed.
    Hook,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Codec(serde_json::Error),
    CorruptRow(&'static str),
    NoHistory(LogTable),
    InvalidInput(&'static str),
    UnknownChangeset {
        changeset_id: String,
        table: LogTable,
    },
    DestinationOccupied {
        changeset_id: String,
        table: LogTable,
    },
    TimestampRegression {
        seq: i64,
        latest_seq: i64,
    },
    RedoSuperseded {
        changeset_id: String,
        redo_seq: i64,
        latest_seq: i64,
    },
    Hook(HookError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Sql(_) | Self::Codec(_) | Self::CorruptRow(_) => {
                ErrorKind::Storage
            }
            Self::NoHistory(_) => ErrorKind::NoHistory,
            Self::InvalidInput(_)
            | Self::UnknownChangeset { .. }
            | Self::DestinationOccupied { .. }
            | Self::TimestampRegression { .. }
            | Self::RedoSuperseded { .. } => ErrorKind::Validation,
            Self::Hook(_) => ErrorKind::Hook,
        }
    }

    pub fn is_no_history(&self) -> bool {
        self.kind() == ErrorKind::NoHistory
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Codec(err) => write!(f, "triple codec: {err}"),
            Self::CorruptRow(message) => write!(f, "corrupt log row: {message}"),
            Self::NoHistory(table) => match table {
                LogTable::Active => write!(f, "no changesets to undo"),
                LogTable::Redo => write!(f, "no changesets to redo"),
            },
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownChangeset {
                changeset_id,
                table,
            } => write!(
                f,
                "unknown changeset (id={changeset_id}, table={})",
                table.as_str()
            ),
            Self::DestinationOccupied {
                changeset_id,
                table,
            } => write!(
                f,
                "destination already holds changeset (id={changeset_id}, table={})",
                table.as_str()
            ),
            Self::TimestampRegression { seq, latest_seq } => write!(
                f,
                "timestamp precedes latest version (seq={seq}, latest_seq={latest_seq})"
            ),
            Self::RedoSuperseded {
                changeset_id,
                redo_seq,
                latest_seq,
            } => write!(
                f,
                "redo superseded by a newer commit (id={changeset_id}, redo_seq={redo_seq}, latest_seq={latest_seq})"
            ),
            Self::Hook(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Hook(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

impl From<HookError> for StoreError {
    fn from(value: HookError) -> Self {
        Self::Hook(value)
    }
}
