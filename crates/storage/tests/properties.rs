#![forbid(unsafe_code)]

//! Property tests: random commit histories keep the log and the live graphs
//! in agreement under reconstruction, undo and redo.

use proptest::prelude::*;
use std::collections::BTreeSet;
use vg_core::history::Timestamp;
use vg_core::{Term, Triple};
use vg_storage::{StoreError, VersionedGraphCollection};

const GRAPHS: [&str; 2] = ["urn:g:hvac", "urn:g:lighting"];

#[derive(Clone, Debug)]
struct Step {
    graph: usize,
    ops: Vec<(bool, u8, u8)>,
}

fn arb_step() -> impl Strategy<Value = Step> {
    (
        0usize..GRAPHS.len(),
        prop::collection::vec((any::<bool>(), 0u8..4, 0u8..3), 0..6),
    )
        .prop_map(|(graph, ops)| Step { graph, ops })
}

#[derive(Clone, Debug)]
enum Action {
    Commit(Step),
    Undo,
    Redo,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => arb_step().prop_map(Action::Commit),
        2 => Just(Action::Undo),
        2 => Just(Action::Redo),
    ]
}

fn triple(subject: u8, object: u8) -> Triple {
    let subject = if subject == 0 {
        Term::blank("b0")
    } else {
        Term::iri(format!("urn:ex:s{subject}"))
    };
    Triple::new(subject, Term::iri("urn:ex:feeds"), Term::iri(format!("urn:ex:o{object}")))
}

fn commit_step(graphs: &mut VersionedGraphCollection, step: &Step) -> Option<Timestamp> {
    let receipt = graphs
        .new_changeset(GRAPHS[step.graph], |cs| {
            for &(insert, subject, object) in &step.ops {
                if insert {
                    cs.add(triple(subject, object));
                } else {
                    cs.remove(triple(subject, object));
                }
            }
            Ok::<_, StoreError>(())
        })
        .expect("commit step");
    receipt.version.map(|version| version.timestamp)
}

/// Commits every step; returns the timestamp and the union snapshot of each
/// effective commit, in order.
fn run(
    graphs: &mut VersionedGraphCollection,
    steps: &[Step],
) -> Vec<(Timestamp, BTreeSet<Triple>)> {
    let mut history = Vec::new();
    for step in steps {
        if let Some(timestamp) = commit_step(graphs, step) {
            let snapshot = graphs.graph_at(None, None).expect("snapshot");
            history.push((timestamp, snapshot.triples().clone()));
        }
    }
    history
}

fn live_union(graphs: &VersionedGraphCollection) -> BTreeSet<Triple> {
    let mut out = BTreeSet::new();
    for name in GRAPHS {
        out.extend(graphs.latest(name).expect("live graph"));
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every recorded point in history reconstructs to the state observed
    /// right after that commit, and reconstruction is repeatable.
    #[test]
    fn graph_at_matches_observed_history(steps in prop::collection::vec(arb_step(), 1..12)) {
        let mut graphs: VersionedGraphCollection =
            VersionedGraphCollection::open_in_memory().expect("open");
        let history = run(&mut graphs, &steps);

        let now = graphs.graph_at(None, None).expect("now");
        prop_assert_eq!(now.triples(), &live_union(&graphs));

        for (timestamp, expected) in &history {
            let first = graphs.graph_at(Some(*timestamp), None).expect("graph at");
            let second = graphs.graph_at(Some(*timestamp), None).expect("graph at again");
            prop_assert_eq!(first.triples(), expected);
            prop_assert_eq!(first.triples(), second.triples());
        }

        let origin = graphs.graph_at(Some(Timestamp::ORIGIN), None).expect("origin");
        prop_assert!(origin.is_empty());
    }

    /// Undoing j of k commits then redoing them restores the exact state, and
    /// the log bookkeeping follows the undo depth.
    #[test]
    fn undo_then_redo_is_identity(
        steps in prop::collection::vec(arb_step(), 1..10),
        depth in 0usize..10,
    ) {
        let mut graphs: VersionedGraphCollection =
            VersionedGraphCollection::open_in_memory().expect("open");
        let history = run(&mut graphs, &steps);
        let before = live_union(&graphs);
        let depth = depth.min(history.len());

        for _ in 0..depth {
            graphs.undo().expect("undo");
        }
        prop_assert_eq!(graphs.versions(None).expect("versions").len(), history.len() - depth);
        prop_assert_eq!(graphs.redo_versions().expect("redo versions").len(), depth);

        let expected = match history.len() - depth {
            0 => BTreeSet::new(),
            n => history[n - 1].1.clone(),
        };
        prop_assert_eq!(live_union(&graphs), expected);

        for _ in 0..depth {
            graphs.redo().expect("redo");
        }
        prop_assert_eq!(live_union(&graphs), before);
        prop_assert_eq!(graphs.versions(None).expect("versions").len(), history.len());
        prop_assert!(graphs.redo_versions().expect("redo versions").is_empty());
    }

    /// Commits interleaved with undo and redo track a stack model: undo pops
    /// the newest active changeset, redo re-applies the most recently undone
    /// one unless a newer commit has superseded it.
    #[test]
    fn interleaved_undo_redo_follows_stack_model(
        actions in prop::collection::vec(arb_action(), 1..24),
    ) {
        let mut graphs: VersionedGraphCollection =
            VersionedGraphCollection::open_in_memory().expect("open");
        let mut active: Vec<(Timestamp, BTreeSet<Triple>)> = Vec::new();
        let mut parked: Vec<(Timestamp, BTreeSet<Triple>)> = Vec::new();

        for action in &actions {
            match action {
                Action::Commit(step) => {
                    if let Some(timestamp) = commit_step(&mut graphs, step) {
                        active.push((timestamp, live_union(&graphs)));
                    }
                }
                Action::Undo => match active.pop() {
                    Some(entry) => {
                        let undone = graphs.undo().expect("undo");
                        prop_assert_eq!(undone.timestamp, entry.0);
                        parked.push(entry);
                    }
                    None => {
                        let err = graphs.undo().expect_err("undo on empty log");
                        prop_assert!(err.is_no_history());
                    }
                },
                Action::Redo => {
                    let superseded = match (parked.last(), active.last()) {
                        (Some(head), Some(latest)) => latest.0.seq > head.0.seq,
                        _ => false,
                    };
                    if parked.is_empty() {
                        let err = graphs.redo().expect_err("redo on empty log");
                        prop_assert!(err.is_no_history());
                    } else if superseded {
                        let err = graphs.redo().expect_err("superseded redo");
                        let is_superseded = matches!(err, StoreError::RedoSuperseded { .. });
                        prop_assert!(is_superseded);
                    } else {
                        let redone = graphs.redo().expect("redo");
                        let entry = parked.pop().expect("model head");
                        prop_assert_eq!(redone.timestamp, entry.0);
                        active.push(entry);
                    }
                }
            }

            let expected = active.last().map(|entry| entry.1.clone()).unwrap_or_default();
            prop_assert_eq!(live_union(&graphs), expected);
            prop_assert_eq!(graphs.versions(None).expect("versions").len(), active.len());
            prop_assert_eq!(graphs.redo_versions().expect("redo versions").len(), parked.len());
        }
    }

    /// The triple-count difference between two points in time equals the net
    /// additions minus deletions of the changesets between them.
    #[test]
    fn count_delta_equals_net_effect(steps in prop::collection::vec(arb_step(), 2..12)) {
        let mut graphs: VersionedGraphCollection =
            VersionedGraphCollection::open_in_memory().expect("open");

        let mut points = vec![(Timestamp::ORIGIN, 0i64)];
        let mut net = 0i64;
        for step in &steps {
            let receipt = graphs
                .new_changeset(GRAPHS[step.graph], |cs| {
                    for &(insert, subject, object) in &step.ops {
                        if insert {
                            cs.add(triple(subject, object));
                        } else {
                            cs.remove(triple(subject, object));
                        }
                    }
                    Ok::<_, StoreError>(())
                })
                .expect("commit step");
            if let Some(version) = receipt.version {
                net += receipt.additions as i64 - receipt.deletions as i64;
                points.push((version.timestamp, net));
            }
        }

        for (timestamp, expected) in &points {
            let dataset = graphs.dataset_at(*timestamp).expect("dataset at");
            let total: usize = dataset.graphs().map(|(_, graph)| graph.len()).sum();
            prop_assert_eq!(total as i64, *expected);
        }
    }
}
