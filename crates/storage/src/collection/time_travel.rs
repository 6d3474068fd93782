#![forbid(unsafe_code)]

use super::{VersionedGraphCollection, canonicalize_graph, invert_record};
use crate::store::StoreError;
use std::collections::BTreeSet;
use vg_core::history::Timestamp;
use vg_core::ids::GraphName;
use vg_core::{Dataset, Graph, TripleStore};

impl<S: TripleStore> VersionedGraphCollection<S> {
    /// Walks `working` back to `timestamp` by inverting every newer row,
    /// newest first. Shared by `undo` and every time-travel read.
    pub(crate) fn reconstruct(
        &self,
        working: &mut Graph,
        timestamp: Timestamp,
        graph: Option<&GraphName>,
    ) -> Result<(), StoreError> {
        for record in self.log.rows_since(timestamp, graph)? {
            invert_record(working, &record);
        }
        Ok(())
    }

    /// Isolated copy of one graph, or of the union of all graphs, as of
    /// `timestamp` (the latest version when `None`). The collection's prefix
    /// bindings are copied onto the result.
    pub fn graph_at(
        &self,
        timestamp: Option<Timestamp>,
        graph: Option<&str>,
    ) -> Result<Graph, StoreError> {
        let timestamp = match timestamp {
            Some(timestamp) => timestamp,
            None => self.now()?,
        };

        let mut out = match graph {
            Some(graph) => {
                let graph = canonicalize_graph(graph)?;
                let mut working = self.store.graph_copy(&graph);
                self.reconstruct(&mut working, timestamp, Some(&graph))?;
                working
            }
            None => self.dataset_at(timestamp)?.union(),
        };
        for (prefix, iri) in self.store.prefixes() {
            out.bind(prefix, iri);
        }
        Ok(out)
    }

    /// Every named graph as of `timestamp`, each reconstructed on its own so a
    /// triple shared by two graphs is tracked per graph.
    pub fn dataset_at(&self, timestamp: Timestamp) -> Result<Dataset, StoreError> {
        let mut names: BTreeSet<GraphName> = self.store.all_graphs().into_iter().collect();
        names.extend(self.log.graphs_since(timestamp)?);

        let mut out = Dataset::new();
        for name in names {
            let mut working = self.store.graph_copy(&name);
            self.reconstruct(&mut working, timestamp, Some(&name))?;
            out.insert_graph(name, working);
        }
        for (prefix, iri) in self.store.prefixes() {
            out.bind_prefix(&prefix, &iri);
        }
        Ok(out)
    }

    /// `graph_at` for the latest version committed at or before `wall_ms`.
    pub fn graph_at_wall_clock(
        &self,
        wall_ms: i64,
        graph: Option<&str>,
    ) -> Result<Graph, StoreError> {
        let timestamp = self.log.timestamp_at_wall_clock(wall_ms)?;
        self.graph_at(Some(timestamp), graph)
    }

    fn now(&self) -> Result<Timestamp, StoreError> {
        Ok(self
            .log
            .latest_version()?
            .map(|version| version.timestamp)
            .unwrap_or(Timestamp::ORIGIN))
    }
}
