use anyhow::Result;
use strata::config::StrataConfig;
use strata::graph::status::graph_status;

/// Display graph size and freshness in the terminal.
pub fn status(config: &StrataConfig) -> Result<()> {
    let index = super::open_index(config)?;
    let graph = index.current();
    let threshold = config.status.rebuild_threshold;
    let response = index.with_db(|conn| graph_status(graph.as_deref(), conn, threshold))?;

    println!("Graph Status");
    println!("{}", "=".repeat(40));
    println!("  Vault:               {}", index.vault_root().display());
    println!("  Nodes:               {}", response.node_count);
    println!("  Edges:               {}", response.edge_count);
    match response.last_built_at {
        Some(at) => println!("  Last built:          {}", at.to_rfc3339()),
        None => println!("  Last built:          never"),
    }
    println!("  Stale documents:     {}", response.stale_node_count);
    println!("  Freshness:           {:.1}%", response.freshness_percent);
    if response.rebuild_recommended {
        println!();
        println!("Rebuild recommended: run `strata build`.");
    }

    Ok(())
}
