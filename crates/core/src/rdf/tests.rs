use super::*;
use crate::ids::{ChangesetId, ChangesetIdError, GraphName, GraphNameError};

fn t(s: &str, o: &str) -> Triple {
    Triple::new(
        Term::iri(format!("urn:ex#{s}")),
        Term::iri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
        Term::iri(format!("https://brickschema.org/schema/Brick#{o}")),
    )
}

#[test]
fn graph_name_validation() {
    assert_eq!(GraphName::try_new("").unwrap_err(), GraphNameError::Empty);
    assert_eq!(GraphName::try_new("   ").unwrap_err(), GraphNameError::Empty);
    assert_eq!(
        GraphName::try_new("urn:bad\u{0007}").unwrap_err(),
        GraphNameError::ContainsControl
    );
    assert_eq!(
        GraphName::try_new("a".repeat(4096)).unwrap_err(),
        GraphNameError::TooLong
    );
    assert_eq!(GraphName::try_new(" urn:g ").unwrap().as_str(), "urn:g");
}

#[test]
fn changeset_id_validation() {
    assert_eq!(ChangesetId::try_new("").unwrap_err(), ChangesetIdError::Empty);
    assert_eq!(
        ChangesetId::try_new("cs 1").unwrap_err(),
        ChangesetIdError::InvalidChar { ch: ' ', index: 2 }
    );
    assert!(ChangesetId::try_new("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
}

#[test]
fn dataset_drops_graphs_that_become_empty() {
    let mut dataset = Dataset::new();
    let g = GraphName::try_new("urn:g").unwrap();

    assert!(dataset.add_triple(&g, t("a", "Sensor")));
    assert!(!dataset.add_triple(&g, t("a", "Sensor")));
    assert_eq!(dataset.all_graphs(), vec![g.clone()]);
    assert_eq!(dataset.len(), 1);

    assert!(dataset.remove_triple(&g, &t("a", "Sensor")));
    assert!(!dataset.remove_triple(&g, &t("a", "Sensor")));
    assert!(dataset.all_graphs().is_empty());
    assert_eq!(dataset.len(), 0);
}

#[test]
fn dataset_union_merges_graphs_and_prefixes() {
    let mut dataset = Dataset::new();
    let g1 = GraphName::try_new("urn:g1").unwrap();
    let g2 = GraphName::try_new("urn:g2").unwrap();
    dataset.add_triple(&g1, t("a", "Sensor"));
    dataset.add_triple(&g2, t("a", "Sensor"));
    dataset.add_triple(&g2, t("b", "Point"));
    dataset.bind_prefix("ex", "urn:ex#");

    let union = dataset.union();
    assert_eq!(union.len(), 2);
    assert_eq!(union.prefix("ex"), Some("urn:ex#"));
    assert_eq!(dataset.graph_copy(&g2).len(), 2);
}

#[test]
fn terms_keep_blank_labels_and_render_literals() {
    let blank = Term::blank("b0");
    assert!(blank.is_blank());
    assert_eq!(blank.to_string(), "_:b0");
    assert_eq!(
        Term::lang_literal("say \"hi\"", "en").to_string(),
        "\"say \\\"hi\\\"\"@en"
    );
    assert_eq!(
        Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#integer").to_string(),
        "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>"
    );
}

#[test]
fn graph_reads_and_writes() {
    let mut graph: Graph = vec![t("a", "Sensor"), t("b", "Sensor")].into_iter().collect();
    assert_eq!(graph.len(), 2);
    assert!(graph.contains(&t("a", "Sensor")));
    assert!(graph.remove(&t("a", "Sensor")));
    assert!(!graph.contains(&t("a", "Sensor")));

    let other: Graph = std::iter::once(t("b", "Sensor")).collect();
    assert!(graph.same_triples(&other));
}
