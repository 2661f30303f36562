use anyhow::Result;
use strata::config::StrataConfig;
use strata::graph::activation::ActivationConfig;
use strata::graph::context::{context_for_query, ContextOptions};

/// Print the assembled context for a free-text query.
pub fn context(
    config: &StrataConfig,
    query: &str,
    token_budget: Option<usize>,
    include_full: bool,
) -> Result<()> {
    let index = super::open_index(config)?;
    let graph = super::require_graph(&index)?;

    let mut options = ContextOptions::from_config(&config.context);
    if let Some(budget) = token_budget {
        options.token_budget = budget;
    }
    options.include_full = include_full;

    let activation = ActivationConfig::from_defaults(&config.query);
    let response = context_for_query(&graph, &index.document_source(), query, &activation, &options)?;

    println!("{}", response.context);
    eprintln!(
        "{} document(s), ~{} tokens, {} truncated",
        response.document_count, response.estimated_tokens, response.truncated_count
    );

    Ok(())
}
