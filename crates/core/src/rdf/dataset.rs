#![forbid(unsafe_code)]

use super::{Graph, Triple};
use crate::ids::GraphName;
use std::collections::BTreeMap;

/// The live triple store a versioned collection materializes into.
///
/// Implementations own term storage and printing; callers only rely on triple
/// equality. Mutations report whether they changed anything.
pub trait TripleStore {
    fn add_triple(&mut self, graph: &GraphName, triple: Triple) -> bool;

    fn remove_triple(&mut self, graph: &GraphName, triple: &Triple) -> bool;

    fn contains(&self, graph: &GraphName, triple: &Triple) -> bool;

    fn triples_in(&self, graph: &GraphName) -> Vec<Triple>;

    fn all_graphs(&self) -> Vec<GraphName>;

    fn bind_prefix(&mut self, prefix: &str, iri: &str);

    fn prefixes(&self) -> Vec<(String, String)>;

    fn graph_copy(&self, graph: &GraphName) -> Graph {
        self.triples_in(graph).into_iter().collect()
    }

    fn len(&self) -> usize {
        self.all_graphs()
            .iter()
            .map(|graph| self.triples_in(graph).len())
            .sum()
    }
}

/// In-memory named-graph store. Empty graphs are dropped eagerly so
/// `all_graphs` only lists graphs that hold triples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    graphs: BTreeMap<GraphName, Graph>,
    prefixes: BTreeMap<String, String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self, name: &GraphName) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn graphs(&self) -> impl Iterator<Item = (&GraphName, &Graph)> {
        self.graphs.iter()
    }

    pub fn insert_graph(&mut self, name: GraphName, graph: Graph) {
        if graph.is_empty() {
            self.graphs.remove(&name);
        } else {
            self.graphs.insert(name, graph);
        }
    }

    /// Set union of every named graph, carrying the dataset's prefixes.
    pub fn union(&self) -> Graph {
        let mut out = Graph::new();
        for graph in self.graphs.values() {
            out.union_with(graph);
        }
        for (prefix, iri) in &self.prefixes {
            out.bind(prefix.clone(), iri.clone());
        }
        out
    }
}

impl TripleStore for Dataset {
    fn add_triple(&mut self, graph: &GraphName, triple: Triple) -> bool {
        self.graphs.entry(graph.clone()).or_default().insert(triple)
    }

    fn remove_triple(&mut self, graph: &GraphName, triple: &Triple) -> bool {
        let Some(target) = self.graphs.get_mut(graph) else {
            return false;
        };
        let removed = target.remove(triple);
        if target.is_empty() {
            self.graphs.remove(graph);
        }
        removed
    }

    fn contains(&self, graph: &GraphName, triple: &Triple) -> bool {
        self.graphs
            .get(graph)
            .is_some_and(|target| target.contains(triple))
    }

    fn triples_in(&self, graph: &GraphName) -> Vec<Triple> {
        self.graphs
            .get(graph)
            .map(|target| target.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn all_graphs(&self) -> Vec<GraphName> {
        self.graphs.keys().cloned().collect()
    }

    fn bind_prefix(&mut self, prefix: &str, iri: &str) {
        self.prefixes.insert(prefix.to_string(), iri.to_string());
    }

    fn prefixes(&self) -> Vec<(String, String)> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| (prefix.clone(), iri.clone()))
            .collect()
    }

    fn graph_copy(&self, graph: &GraphName) -> Graph {
        self.graphs.get(graph).cloned().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.graphs.values().map(Graph::len).sum()
    }
}
