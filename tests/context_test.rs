mod helpers;

use helpers::{doc, TestVault};
use strata::graph::activation::ActivationConfig;
use strata::graph::context::{context_for_query, estimate_tokens, ContextOptions};
use strata::graph::index::BuildMode;

#[test]
fn context_reads_bodies_from_vault() {
    let vault = TestVault::seeded();
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();
    let graph = index.snapshot().unwrap();

    let resp = context_for_query(
        &graph,
        &index.document_source(),
        "Apollo",
        &ActivationConfig::default(),
        &ContextOptions::default(),
    )
    .unwrap();

    assert!(resp.context.starts_with("## Apollo\n"));
    assert!(resp.context.contains("Led by [[ann]]"));
    assert!(!resp.context.contains("layer: 2\ntags"), "frontmatter must not leak");
    assert_eq!(resp.estimated_tokens, estimate_tokens(&resp.context));
    assert_eq!(resp.truncated_count, 0);
}

#[test]
fn budget_bounds_estimated_tokens() {
    let vault = TestVault::seeded();
    for i in 0..12 {
        vault.write(
            &format!("notes/n{i:02}.md"),
            &doc(3, &["bulk"], &format!("# Note {i}\n{}\n", "filler text ".repeat(60))),
        );
    }
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();
    let graph = index.snapshot().unwrap();

    let activation = ActivationConfig {
        max_results: 20,
        ..ActivationConfig::default()
    };
    let options = ContextOptions {
        token_budget: 300,
        ..ContextOptions::default()
    };
    let resp = context_for_query(&graph, &index.document_source(), "#bulk", &activation, &options).unwrap();

    assert!(resp.estimated_tokens <= 300);
    assert!(resp.document_count > 0);
    assert!(resp.truncated_count > 0);
}

#[test]
fn unknown_query_gives_empty_context() {
    let vault = TestVault::seeded();
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();
    let graph = index.snapshot().unwrap();

    let resp = context_for_query(
        &graph,
        &index.document_source(),
        "zz qq",
        &ActivationConfig::default(),
        &ContextOptions::default(),
    )
    .unwrap();
    assert_eq!(resp.context, "");
    assert_eq!(resp.document_count, 0);
    assert_eq!(resp.estimated_tokens, 0);
}
