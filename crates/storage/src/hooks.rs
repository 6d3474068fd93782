#![forbid(unsafe_code)]

use vg_core::history::Timestamp;
use vg_core::ids::{ChangesetId, GraphName};
use vg_core::{Triple, TripleStore};

pub type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub type Hook = Box<dyn Fn(&CommitContext<'_>) -> HookResult>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    PreCommit,
    PostCommit,
}

impl HookPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreCommit => "pre-commit",
            Self::PostCommit => "post-commit",
        }
    }
}

/// What a hook sees of the commit in flight.
///
/// Pre-commit hooks observe the live store before the changeset is applied,
/// post-commit hooks observe it afterwards. `timestamp` is `None` for a
/// changeset without operations, which writes nothing.
pub struct CommitContext<'a> {
    pub changeset_id: &'a ChangesetId,
    pub graph: &'a GraphName,
    pub timestamp: Option<Timestamp>,
    pub deletions: &'a [Triple],
    pub additions: &'a [Triple],
    pub store: &'a dyn TripleStore,
}

#[derive(Debug)]
pub struct HookError {
    pub hook: String,
    pub phase: HookPhase,
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} hook failed (hook={}): {}",
            self.phase.as_str(),
            self.hook,
            self.source
        )
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Named hook slots. Registering a name that already exists replaces that
/// hook and keeps its position in the invocation order.
#[derive(Default)]
pub struct HookRegistry {
    precommit: Vec<(String, Hook)>,
    postcommit: Vec<(String, Hook)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, phase: HookPhase, name: impl Into<String>, hook: Hook) {
        let name = name.into();
        let slots = self.slots_mut(phase);
        match slots.iter().position(|(existing, _)| *existing == name) {
            Some(index) => slots[index].1 = hook,
            None => slots.push((name, hook)),
        }
    }

    pub fn remove(&mut self, phase: HookPhase, name: &str) -> bool {
        let slots = self.slots_mut(phase);
        let before = slots.len();
        slots.retain(|(existing, _)| existing != name);
        slots.len() != before
    }

    pub fn names(&self, phase: HookPhase) -> Vec<&str> {
        self.slots(phase)
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Stops at the first failing hook.
    pub fn run_precommit(&self, context: &CommitContext<'_>) -> Result<(), HookError> {
        for (name, hook) in &self.precommit {
            hook(context).map_err(|source| HookError {
                hook: name.clone(),
                phase: HookPhase::PreCommit,
                source,
            })?;
        }
        Ok(())
    }

    /// Runs every hook; failures are collected, not short-circuited.
    pub fn run_postcommit(&self, context: &CommitContext<'_>) -> Vec<HookError> {
        let mut failures = Vec::new();
        for (name, hook) in &self.postcommit {
            if let Err(source) = hook(context) {
                failures.push(HookError {
                    hook: name.clone(),
                    phase: HookPhase::PostCommit,
                    source,
                });
            }
        }
        failures
    }

    fn slots(&self, phase: HookPhase) -> &Vec<(String, Hook)> {
        match phase {
            HookPhase::PreCommit => &self.precommit,
            HookPhase::PostCommit => &self.postcommit,
        }
    }

    fn slots_mut(&mut self, phase: HookPhase) -> &mut Vec<(String, Hook)> {
        match phase {
            HookPhase::PreCommit => &mut self.precommit,
            HookPhase::PostCommit => &mut self.postcommit,
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("precommit", &self.names(HookPhase::PreCommit))
            .field("postcommit", &self.names(HookPhase::PostCommit))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vg_core::Dataset;

    fn context<'a>(
        id: &'a ChangesetId,
        graph: &'a GraphName,
        store: &'a Dataset,
    ) -> CommitContext<'a> {
        CommitContext {
            changeset_id: id,
            graph,
            timestamp: None,
            deletions: &[],
            additions: &[],
            store,
        }
    }

    #[test]
    fn reregistering_a_name_replaces_in_place() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        for (name, tag) in [("audit", "audit-v1"), ("index", "index"), ("audit", "audit-v2")] {
            let calls = Rc::clone(&calls);
            registry.register(
                HookPhase::PreCommit,
                name,
                Box::new(move |_: &CommitContext<'_>| -> HookResult {
                    calls.borrow_mut().push(tag);
                    Ok(())
                }),
            );
        }

        assert_eq!(registry.names(HookPhase::PreCommit), vec!["audit", "index"]);

        let id = ChangesetId::try_new("cs-1").unwrap();
        let graph = GraphName::try_new("urn:g").unwrap();
        let store = Dataset::new();
        registry.run_precommit(&context(&id, &graph, &store)).unwrap();
        assert_eq!(*calls.borrow(), vec!["audit-v2", "index"]);
    }

    #[test]
    fn precommit_stops_at_first_failure_postcommit_collects_all() {
        let mut registry = HookRegistry::new();
        for phase in [HookPhase::PreCommit, HookPhase::PostCommit] {
            registry.register(
                phase,
                "first",
                Box::new(|_: &CommitContext<'_>| -> HookResult { Err("boom".into()) }),
            );
            registry.register(
                phase,
                "second",
                Box::new(|_: &CommitContext<'_>| -> HookResult { Err("bang".into()) }),
            );
        }

        let id = ChangesetId::try_new("cs-1").unwrap();
        let graph = GraphName::try_new("urn:g").unwrap();
        let store = Dataset::new();
        let ctx = context(&id, &graph, &store);

        let err = registry.run_precommit(&ctx).unwrap_err();
        assert_eq!(err.hook, "first");
        assert_eq!(err.phase, HookPhase::PreCommit);
        assert_eq!(err.to_string(), "pre-commit hook failed (hook=first): boom");

        let failures = registry.run_postcommit(&ctx);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].hook, "second");

        assert!(registry.remove(HookPhase::PostCommit, "first"));
        assert!(!registry.remove(HookPhase::PostCommit, "first"));
        assert_eq!(registry.names(HookPhase::PostCommit), vec!["second"]);
    }
}
