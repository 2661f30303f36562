use anyhow::Result;
use strata::config::StrataConfig;
use strata::graph::activation::{spread_activation, ActivationConfig};

/// Run a spreading-activation query and print the ranked results.
pub fn query(
    config: &StrataConfig,
    seeds: &[String],
    max_results: Option<usize>,
    max_hops: Option<usize>,
    layers: &[u8],
) -> Result<()> {
    let index = super::open_index(config)?;
    let graph = super::require_graph(&index)?;

    let mut query = ActivationConfig::from_defaults(&config.query);
    if let Some(n) = max_results {
        query.max_results = n;
    }
    if let Some(h) = max_hops {
        query.max_hops = h;
    }
    if !layers.is_empty() {
        query.layer_filter = Some(layers.iter().copied().collect());
    }

    let response = spread_activation(&graph, seeds, &query)?;

    if response.results.is_empty() {
        println!("No documents matched {seeds:?}.");
        return Ok(());
    }

    println!(
        "{} result(s), {} node(s) explored",
        response.results.len(),
        response.explored_nodes
    );
    println!("{}", "=".repeat(40));
    for (i, r) in response.results.iter().enumerate() {
        let title = graph.node(&r.node_id).map(|n| n.title.as_str()).unwrap_or("");
        println!("{:>2}. [{:.3}] {} ({})", i + 1, r.score, r.node_id, title);
        if r.hops > 0 {
            println!("      via {} ({} hop(s))", r.path.join(" -> "), r.hops);
        }
    }

    Ok(())
}
