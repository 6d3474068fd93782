#![forbid(unsafe_code)]

pub mod rdf;

pub use rdf::{Dataset, Graph, Literal, Term, Triple, TripleStore};

pub mod ids {
    use std::fmt;

    /// Identifier of a named graph (an IRI or any other opaque name).
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct GraphName(String);

    impl GraphName {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, GraphNameError> {
            let value = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(GraphNameError::Empty);
            }
            if trimmed.len() > 2048 {
                return Err(GraphNameError::TooLong);
            }
            if trimmed.chars().any(|c| c.is_control()) {
                return Err(GraphNameError::ContainsControl);
            }
            Ok(Self(trimmed.to_string()))
        }
    }

    impl fmt::Display for GraphName {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum GraphNameError {
        Empty,
        TooLong,
        ContainsControl,
    }

    impl GraphNameError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "graph name must not be empty",
                Self::TooLong => "graph name is too long",
                Self::ContainsControl => "graph name contains control characters",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ChangesetId(String);

    impl ChangesetId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, ChangesetIdError> {
            let value = value.into();
            if value.is_empty() {
                return Err(ChangesetIdError::Empty);
            }
            if value.len() > 128 {
                return Err(ChangesetIdError::TooLong);
            }
            for (index, ch) in value.chars().enumerate() {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    continue;
                }
                return Err(ChangesetIdError::InvalidChar { ch, index });
            }
            Ok(Self(value))
        }
    }

    impl fmt::Display for ChangesetId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ChangesetIdError {
        Empty,
        TooLong,
        InvalidChar { ch: char, index: usize },
    }
}

pub mod history {
    use crate::ids::{ChangesetId, GraphName};
    use std::fmt;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Operation {
        Insert,
        Delete,
    }

    impl Operation {
        pub fn is_insertion(self) -> bool {
            matches!(self, Self::Insert)
        }

        pub fn from_insertion(is_insertion: bool) -> Self {
            if is_insertion {
                Self::Insert
            } else {
                Self::Delete
            }
        }

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Insert => "insert",
                Self::Delete => "delete",
            }
        }
    }

    /// Commit point in the history.
    ///
    /// `seq` is a logical counter that strictly increases per committed
    /// changeset and is the only ordering key. `wall_ms` is the commit's
    /// wall-clock time in milliseconds, never decreasing, informational only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Timestamp {
        pub seq: i64,
        pub wall_ms: i64,
    }

    impl Timestamp {
        /// The empty state before any commit.
        pub const ORIGIN: Self = Self { seq: 0, wall_ms: 0 };

        pub fn new(seq: i64, wall_ms: i64) -> Self {
            Self { seq, wall_ms }
        }
    }

    impl fmt::Display for Timestamp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}@{}ms", self.seq, self.wall_ms)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Version {
        pub changeset_id: ChangesetId,
        pub graph: GraphName,
        pub timestamp: Timestamp,
    }
}
