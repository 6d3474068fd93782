#![forbid(unsafe_code)]

use crate::StoreError;
use std::collections::BTreeMap;
use vg_core::ids::{ChangesetId, GraphName};
use vg_core::{Graph, Triple};

/// Pending insertions and deletions against one named graph.
///
/// Nothing touches the delta log or the live graph until the collection
/// commits the changeset. Reads go to a private scratch copy of the graph that
/// already reflects the pending writes.
#[derive(Clone, Debug)]
pub struct Changeset {
    id: ChangesetId,
    graph: GraphName,
    additions: Vec<Triple>,
    deletions: Vec<Triple>,
    prefixes: BTreeMap<String, String>,
    scratch: Graph,
}

impl Changeset {
    pub(crate) fn new(graph: GraphName, base: Graph) -> Result<Self, StoreError> {
        Ok(Self {
            id: fresh_changeset_id()?,
            graph,
            additions: Vec::new(),
            deletions: Vec::new(),
            prefixes: BTreeMap::new(),
            scratch: base,
        })
    }

    pub fn id(&self) -> &ChangesetId {
        &self.id
    }

    pub fn graph(&self) -> &GraphName {
        &self.graph
    }

    pub fn add(&mut self, triple: Triple) {
        self.scratch.insert(triple.clone());
        self.additions.push(triple);
    }

    pub fn remove(&mut self, triple: Triple) {
        self.scratch.remove(&triple);
        self.deletions.push(triple);
    }

    pub fn extend(&mut self, triples: impl IntoIterator<Item = Triple>) {
        for triple in triples {
            self.add(triple);
        }
    }

    /// Prefix binding merged into the collection once the commit lands.
    pub fn bind(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.scratch.contains(triple)
    }

    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.scratch.iter()
    }

    /// Triples visible in the scratch view.
    pub fn triple_count(&self) -> usize {
        self.scratch.len()
    }

    pub fn additions(&self) -> &[Triple] {
        &self.additions
    }

    pub fn deletions(&self) -> &[Triple] {
        &self.deletions
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }

    pub(crate) fn into_parts(self) -> ChangesetParts {
        ChangesetParts {
            id: self.id,
            graph: self.graph,
            additions: self.additions,
            deletions: self.deletions,
            prefixes: self.prefixes,
        }
    }
}

pub(crate) struct ChangesetParts {
    pub id: ChangesetId,
    pub graph: GraphName,
    pub additions: Vec<Triple>,
    pub deletions: Vec<Triple>,
    pub prefixes: BTreeMap<String, String>,
}

fn fresh_changeset_id() -> Result<ChangesetId, StoreError> {
    ChangesetId::try_new(uuid::Uuid::new_v4().hyphenated().to_string())
        .map_err(|_| StoreError::InvalidInput("generated changeset id rejected"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_core::Term;

    fn t(s: &str, o: &str) -> Triple {
        Triple::new(Term::iri(s), Term::iri("urn:p"), Term::iri(o))
    }

    #[test]
    fn reads_its_own_pending_writes() {
        let base: Graph = std::iter::once(t("urn:a", "urn:o")).collect();
        let mut cs = Changeset::new(GraphName::try_new("urn:g").unwrap(), base).unwrap();
        assert!(cs.is_empty());
        assert!(cs.contains(&t("urn:a", "urn:o")));

        cs.remove(t("urn:a", "urn:o"));
        cs.add(t("urn:a", "urn:o2"));

        assert!(!cs.contains(&t("urn:a", "urn:o")));
        assert!(cs.contains(&t("urn:a", "urn:o2")));
        assert_eq!(cs.triple_count(), 1);
        assert_eq!(cs.deletions(), &[t("urn:a", "urn:o")]);
        assert_eq!(cs.additions(), &[t("urn:a", "urn:o2")]);
        assert!(!cs.is_empty());
    }

    #[test]
    fn ids_are_fresh_per_changeset() {
        let graph = GraphName::try_new("urn:g").unwrap();
        let first = Changeset::new(graph.clone(), Graph::new()).unwrap();
        let second = Changeset::new(graph, Graph::new()).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(first.id().as_str().len(), 36);
    }
}
