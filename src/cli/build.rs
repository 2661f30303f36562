use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use strata::config::StrataConfig;
use strata::graph::index::BuildMode;

/// Build (or incrementally refresh) the graph and persist it.
pub fn build(config: &StrataConfig, incremental: bool) -> Result<()> {
    let index = super::open_index(config)?;
    let mode = if incremental {
        BuildMode::Incremental
    } else {
        BuildMode::Full
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg} ({elapsed})")?);
    pb.set_message(format!("Indexing {}", index.vault_root().display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = index.rebuild(mode);
    pb.finish_and_clear();
    let summary = result?;

    println!("Graph Build");
    println!("{}", "=".repeat(40));
    println!("  Mode:                {:?}", summary.mode);
    println!("  Nodes:               {}", summary.node_count);
    println!("  Edges:               {}", summary.edge_count);
    println!("  Parsed:              {}", summary.parsed);
    println!("  Reused:              {}", summary.reused);
    println!("  Invalid frontmatter: {}", summary.failed);
    println!("  Skipped files:       {}", summary.skipped);
    println!("  Built at:            {}", summary.built_at.to_rfc3339());
    println!("  Elapsed:             {} ms", summary.elapsed_ms);

    Ok(())
}
