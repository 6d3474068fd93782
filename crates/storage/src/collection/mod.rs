#![forbid(unsafe_code)]

mod history;
mod time_travel;

use crate::changeset::Changeset;
use crate::hooks::{CommitContext, HookError, HookPhase, HookRegistry, HookResult};
use crate::store::{ChangeRecord, DeltaLog, LogConfig, StoreError};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use vg_core::history::{Operation, Timestamp, Version};
use vg_core::ids::{ChangesetId, GraphName};
use vg_core::{Dataset, Graph, Triple, TripleStore};

/// Outcome of a commit that reached the delta log (or had nothing to write).
#[derive(Debug)]
pub struct CommitReceipt {
    pub changeset_id: ChangesetId,
    /// `None` when the changeset had no effective operations.
    pub version: Option<Version>,
    pub deletions: usize,
    pub additions: usize,
    /// Post-commit hook failures. The commit itself stands regardless.
    pub postcommit_failures: Vec<HookError>,
}

impl CommitReceipt {
    pub fn is_noop(&self) -> bool {
        self.version.is_none()
    }
}

/// Live named graphs plus the delta log that versions them.
///
/// The log is always written first; the live store is a cache that `open`
/// rebuilds by replaying the active log. One writer at a time: every
/// mutating call takes `&mut self`.
#[derive(Debug)]
pub struct VersionedGraphCollection<S = Dataset> {
    store: S,
    log: DeltaLog,
    hooks: HookRegistry,
}

impl<S: TripleStore + Default> VersionedGraphCollection<S> {
    pub fn open(config: &LogConfig) -> Result<Self, StoreError> {
        let log = DeltaLog::open(config)?;
        let mut store = S::default();

        let rows = log.active_rows()?;
        for record in &rows {
            apply_record(&mut store, record);
        }
        if !rows.is_empty() {
            info!(
                rows = rows.len(),
                graphs = store.all_graphs().len(),
                "live graphs rebuilt from delta log"
            );
        }

        Ok(Self::with_store(log, store))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&LogConfig::in_memory())
    }
}

impl<S: TripleStore> VersionedGraphCollection<S> {
    /// Wraps an already materialized store. `store` must match the active log.
    pub fn with_store(log: DeltaLog, store: S) -> Self {
        Self {
            store,
            log,
            hooks: HookRegistry::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &DeltaLog {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the live state of one graph.
    pub fn latest(&self, graph: &str) -> Result<Graph, StoreError> {
        let graph = canonicalize_graph(graph)?;
        Ok(self.store.graph_copy(&graph))
    }

    pub fn bind(&mut self, prefix: &str, iri: &str) {
        self.store.bind_prefix(prefix, iri);
    }

    /// Registers a hook that runs inside the log transaction of every commit.
    ///
    /// The hook sees the pending delta and a read-only view of the live store
    /// as it was before the commit. It can veto the commit by returning an
    /// error, but it cannot add triples to the batch: derived triples belong in
    /// a follow-up changeset, typically opened from the caller after `commit`
    /// returns.
    pub fn add_precommit_hook<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&CommitContext<'_>) -> HookResult + 'static,
    {
        self.hooks.register(HookPhase::PreCommit, name, Box::new(hook));
    }

    /// Registers a hook that runs after the commit is durable and applied. It
    /// observes the updated store; its failure does not undo the commit.
    pub fn add_postcommit_hook<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&CommitContext<'_>) -> HookResult + 'static,
    {
        self.hooks.register(HookPhase::PostCommit, name, Box::new(hook));
    }

    pub fn remove_precommit_hook(&mut self, name: &str) -> bool {
        self.hooks.remove(HookPhase::PreCommit, name)
    }

    pub fn remove_postcommit_hook(&mut self, name: &str) -> bool {
        self.hooks.remove(HookPhase::PostCommit, name)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Opens a changeset scope: `scope` mutates the changeset, and only an
    /// `Ok` return commits it. On `Err` (or a panic) nothing is written.
    pub fn new_changeset<F, E>(&mut self, graph: &str, scope: F) -> Result<CommitReceipt, E>
    where
        F: FnOnce(&mut Changeset) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.run_scope(graph, None, scope)
    }

    /// `new_changeset` recorded at a caller-chosen timestamp. The timestamp
    /// must follow every `seq` the log has allocated (undone changesets
    /// included) and must not move the wall clock backwards; otherwise the
    /// commit fails with a validation error and nothing is written.
    pub fn new_changeset_at<F, E>(
        &mut self,
        graph: &str,
        timestamp: Timestamp,
        scope: F,
    ) -> Result<CommitReceipt, E>
    where
        F: FnOnce(&mut Changeset) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.run_scope(graph, Some(timestamp), scope)
    }

    fn run_scope<F, E>(
        &mut self,
        graph: &str,
        timestamp: Option<Timestamp>,
        scope: F,
    ) -> Result<CommitReceipt, E>
    where
        F: FnOnce(&mut Changeset) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut changeset = self.begin(graph)?;
        if let Err(err) = scope(&mut changeset) {
            debug!(
                changeset = %changeset.id(),
                graph = %changeset.graph(),
                "changeset scope failed; discarded"
            );
            return Err(err);
        }
        Ok(self.commit_with(changeset, timestamp)?)
    }

    /// Starts a changeset whose scratch view is a copy of the live graph.
    /// Dropping it without `commit` discards it.
    pub fn begin(&self, graph: &str) -> Result<Changeset, StoreError> {
        let graph = canonicalize_graph(graph)?;
        let base = self.store.graph_copy(&graph);
        Changeset::new(graph, base)
    }

    /// Persists the changeset, then applies it to the live graph.
    ///
    /// Only operations that change the graph are recorded: removing an absent
    /// triple or adding a present one writes no row. Deletions are applied
    /// before additions. Pre-commit hooks run inside the log transaction, so
    /// their failure leaves no trace. Post-commit hook failures are logged and
    /// returned in the receipt; the commit is not rolled back.
    pub fn commit(&mut self, changeset: Changeset) -> Result<CommitReceipt, StoreError> {
        self.commit_with(changeset, None)
    }

    /// `commit` at a caller-chosen timestamp; see `new_changeset_at`.
    pub fn commit_at(
        &mut self,
        changeset: Changeset,
        timestamp: Timestamp,
    ) -> Result<CommitReceipt, StoreError> {
        self.commit_with(changeset, Some(timestamp))
    }

    fn commit_with(
        &mut self,
        changeset: Changeset,
        timestamp: Option<Timestamp>,
    ) -> Result<CommitReceipt, StoreError> {
        let started = Instant::now();
        let parts = changeset.into_parts();
        let (deletions, additions) =
            effective_delta(&self.store, &parts.graph, &parts.deletions, &parts.additions);

        let version = if deletions.is_empty() && additions.is_empty() {
            let context = CommitContext {
                changeset_id: &parts.id,
                graph: &parts.graph,
                timestamp: None,
                deletions: &deletions,
                additions: &additions,
                store: &self.store,
            };
            self.hooks.run_precommit(&context)?;
            None
        } else {
            let hooks = &self.hooks;
            let store = &self.store;
            let version = self.log.commit_changeset_at(
                &parts.id,
                &parts.graph,
                timestamp,
                &deletions,
                &additions,
                |version| {
                    let context = CommitContext {
                        changeset_id: &version.changeset_id,
                        graph: &version.graph,
                        timestamp: Some(version.timestamp),
                        deletions: &deletions,
                        additions: &additions,
                        store,
                    };
                    hooks.run_precommit(&context).map_err(StoreError::Hook)
                },
            )?;

            for triple in &deletions {
                self.store.remove_triple(&parts.graph, triple);
            }
            for triple in &additions {
                self.store.add_triple(&parts.graph, triple.clone());
            }
            Some(version)
        };

        for (prefix, iri) in &parts.prefixes {
            self.store.bind_prefix(prefix, iri);
        }

        let context = CommitContext {
            changeset_id: &parts.id,
            graph: &parts.graph,
            timestamp: version.as_ref().map(|version| version.timestamp),
            deletions: &deletions,
            additions: &additions,
            store: &self.store,
        };
        let postcommit_failures = self.hooks.run_postcommit(&context);
        for failure in &postcommit_failures {
            warn!(
                changeset = %parts.id,
                hook = %failure.hook,
                error = %failure.source,
                "post-commit hook failed; commit stands"
            );
        }

        match &version {
            Some(version) => info!(
                changeset = %parts.id,
                graph = %parts.graph,
                seq = version.timestamp.seq,
                deletions = deletions.len(),
                additions = additions.len(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "changeset committed"
            ),
            None => debug!(
                changeset = %parts.id,
                graph = %parts.graph,
                "changeset had no effective operations"
            ),
        }

        Ok(CommitReceipt {
            changeset_id: parts.id,
            version,
            deletions: deletions.len(),
            additions: additions.len(),
            postcommit_failures,
        })
    }

    pub fn latest_version(&self) -> Result<Option<Version>, StoreError> {
        self.log.latest_version()
    }

    /// Committed versions, most recent first.
    pub fn versions(&self, graph: Option<&str>) -> Result<Vec<Version>, StoreError> {
        let graph = graph.map(canonicalize_graph).transpose()?;
        self.log.versions(graph.as_ref())
    }

    /// Undone changesets waiting for `redo`, next one first.
    pub fn redo_versions(&self) -> Result<Vec<Version>, StoreError> {
        self.log.redo_versions()
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.log.close()
    }
}

fn canonicalize_graph(value: &str) -> Result<GraphName, StoreError> {
    GraphName::try_new(value).map_err(|_| StoreError::InvalidInput("invalid graph name"))
}

/// Filters pending lists down to what actually changes `graph`, simulating
/// deletions first and additions second.
fn effective_delta<S: TripleStore>(
    store: &S,
    graph: &GraphName,
    deletions: &[Triple],
    additions: &[Triple],
) -> (Vec<Triple>, Vec<Triple>) {
    let mut removed = BTreeSet::new();
    let mut effective_deletions = Vec::new();
    for triple in deletions {
        if store.contains(graph, triple) && removed.insert(triple.clone()) {
            effective_deletions.push(triple.clone());
        }
    }

    let mut added = BTreeSet::new();
    let mut effective_additions = Vec::new();
    for triple in additions {
        let present = store.contains(graph, triple) && !removed.contains(triple);
        if !present && added.insert(triple.clone()) {
            effective_additions.push(triple.clone());
        }
    }

    (effective_deletions, effective_additions)
}

/// Replays a row forward against the live store.
fn apply_record<S: TripleStore>(store: &mut S, record: &ChangeRecord) {
    trace!(
        changeset = %record.changeset_id,
        graph = %record.graph,
        operation = record.operation.as_str(),
        triple = %record.triple,
        "row applied"
    );
    match record.operation {
        Operation::Insert => {
            store.add_triple(&record.graph, record.triple.clone());
        }
        Operation::Delete => {
            store.remove_triple(&record.graph, &record.triple);
        }
    }
}

/// Undoes a row on a working copy: an inserted triple was absent before the
/// row, a deleted one was present.
fn invert_record(working: &mut Graph, record: &ChangeRecord) {
    match record.operation {
        Operation::Insert => {
            working.remove(&record.triple);
        }
        Operation::Delete => {
            working.insert(record.triple.clone());
        }
    }
}

/// Makes the live graph `name` hold exactly the triples of `target`.
fn replace_graph<S: TripleStore>(store: &mut S, name: &GraphName, target: &Graph) {
    let current = store.triples_in(name);
    for triple in &current {
        if !target.contains(triple) {
            store.remove_triple(name, triple);
        }
    }
    for triple in target.iter() {
        if !store.contains(name, triple) {
            store.add_triple(name, triple.clone());
        }
    }
}
