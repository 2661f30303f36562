mod helpers;

use helpers::{doc, TestVault};
use strata::config::InvalidationConfig;
use strata::graph::index::BuildMode;
use strata::graph::invalidation::Invalidator;
use strata::graph::staleness::{load_stale_nodes, mark_stale, record_build};
use strata::graph::status::graph_status;

#[test]
fn status_without_graph_is_empty_and_fresh() {
    let conn = helpers::test_db();
    let status = graph_status(None, &conn, 0.1).unwrap();
    assert_eq!(status.node_count, 0);
    assert_eq!(status.edge_count, 0);
    assert!(status.last_built_at.is_none());
    assert_eq!(status.freshness_percent, 100.0);
    assert!(!status.rebuild_recommended);
}

#[test]
fn stale_marks_drive_rebuild_recommendation() {
    let vault = TestVault::new();
    for i in 0..10 {
        vault.write(&format!("n{i}.md"), &doc(2, &["x"], "body\n"));
    }
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();
    let graph = index.snapshot().unwrap();

    let status = index
        .with_db(|conn| {
            mark_stale(conn, "n1.md", None)?;
            graph_status(Some(graph.as_ref()), conn, 0.1)
        })
        .unwrap();
    assert_eq!(status.stale_node_count, 1);
    assert!((status.freshness_percent - 90.0).abs() < 1e-9);
    assert!(!status.rebuild_recommended);
    assert!(status.last_built_at.is_some());

    let status = index
        .with_db(|conn| {
            mark_stale(conn, "n2.md", None)?;
            graph_status(Some(graph.as_ref()), conn, 0.1)
        })
        .unwrap();
    assert!((status.freshness_percent - 80.0).abs() < 1e-9);
    assert!(status.rebuild_recommended);
}

#[test]
fn record_build_clears_marks_written_before_it() {
    let mut conn = helpers::test_db();
    mark_stale(&conn, "a.md", None).unwrap();
    mark_stale(&conn, "b.md", None).unwrap();
    let now = chrono::Utc::now();
    record_build(&mut conn, now, now, 2).unwrap();
    assert!(load_stale_nodes(&conn).unwrap().is_empty());
}

#[test]
fn invalidator_marks_writes_inside_vault() {
    let vault = TestVault::seeded();
    let conn = helpers::test_db();
    let invalidator = Invalidator::from_config(&InvalidationConfig::default());
    let root = vault.root();
    let abs = root.join("projects/apollo.md");

    assert!(invalidator
        .handle(&conn, &root, "Edit", &abs.to_string_lossy())
        .unwrap());
    assert!(!invalidator
        .handle(&conn, &root, "Bash", &abs.to_string_lossy())
        .unwrap());
    assert!(!invalidator
        .handle(&conn, &root, "Write", "/somewhere/else.md")
        .unwrap());

    let stale = load_stale_nodes(&conn).unwrap();
    assert_eq!(stale.into_iter().collect::<Vec<_>>(), vec!["projects/apollo.md"]);
}
