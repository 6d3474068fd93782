#![forbid(unsafe_code)]

use vg_core::Triple;
use vg_core::history::{Operation, Timestamp};
use vg_core::ids::{ChangesetId, GraphName};

/// The two tables of the delta log. Both share one schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogTable {
    Active,
    Redo,
}

impl LogTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "changesets",
            Self::Redo => "redos",
        }
    }
}

/// One persisted triple-level operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    pub changeset_id: ChangesetId,
    pub timestamp: Timestamp,
    /// Position inside the changeset, in application order.
    pub ordinal: i64,
    pub graph: GraphName,
    pub operation: Operation,
    pub triple: Triple,
}
