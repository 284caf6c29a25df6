//! Tests for show and graph commands

use tempfile::tempdir;
use txt2kg::commands::{graph, show};
use txt2kg::{DocKey, KnowledgeStore, Triple, TripleGraph};

fn saved_store(dir: &std::path::Path) -> std::path::PathBuf {
    let mut store = KnowledgeStore::new();
    store.commit(
        DocKey::Id(0),
        vec![
            Triple::new("Paris", "capital_of", "France"),
            Triple::new("Paris", "located_on", "Seine"),
        ],
    );
    let path = dir.join("kg.json");
    store.save(&path).unwrap();
    path
}

#[test]
fn test_show_runs_on_saved_store() {
    let dir = tempdir().expect("tempdir");
    let path = saved_store(dir.path());

    assert!(show::run(&path, Some(5)).is_ok());
}

#[test]
fn test_graph_runs_on_saved_store() {
    let dir = tempdir().expect("tempdir");
    let path = saved_store(dir.path());

    assert!(graph::run(&path, Some("Paris")).is_ok());

    let store = KnowledgeStore::from_file(&path).unwrap();
    let text = graph::render(&TripleGraph::from_store(&store), None).unwrap();
    assert!(text.starts_with("Data(x=[3, 1], edge_index=[2, 2])"));
}

#[test]
fn test_show_rejects_corrupt_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("kg.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(show::run(&path, None).is_err());
}
