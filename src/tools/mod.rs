pub mod get_context;
pub mod graph_status;
pub mod mark_stale;
pub mod navigate_node;
pub mod query_graph;
pub mod read_document;
pub mod rebuild_graph;

use get_context::GetContextParams;
use graph_status::GraphStatusParams;
use mark_stale::MarkStaleParams;
use navigate_node::NavigateNodeParams;
use query_graph::QueryGraphParams;
use read_document::ReadDocumentParams;
use rebuild_graph::RebuildGraphParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use std::sync::Arc;

use strata::config::StrataConfig;
use strata::error::IndexResult;
use strata::graph::activation::{spread_activation, ActivationConfig};
use strata::graph::context::{context_for_query, ContextOptions};
use strata::graph::index::{BuildMode, GraphIndex};
use strata::graph::invalidation::Invalidator;
use strata::graph::navigate::navigate;
use strata::graph::status::graph_status;

/// The Strata MCP tool handler. Holds the live graph index, the invalidator,
/// and config, and exposes all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct StrataTools {
    tool_router: ToolRouter<Self>,
    index: Arc<GraphIndex>,
    invalidator: Arc<Invalidator>,
    config: Arc<StrataConfig>,
}

#[tool_router]
impl StrataTools {
    pub fn new(index: Arc<GraphIndex>, invalidator: Arc<Invalidator>, config: Arc<StrataConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            index,
            invalidator,
            config,
        }
    }

    /// Spreading-activation recall from seed documents.
    #[tool(description = "Find documents related to seed terms by spreading activation over the vault's knowledge graph. Returns ranked nodes with score, hop count, and the path that reached them.")]
    async fn query_graph(
        &self,
        Parameters(params): Parameters<QueryGraphParams>,
    ) -> Result<String, String> {
        tracing::info!(seeds = ?params.seed, "query_graph called");

        let mut query = ActivationConfig::from_defaults(&self.config.query);
        if let Some(v) = params.max_results {
            query.max_results = v;
        }
        if let Some(v) = params.decay {
            query.decay = v;
        }
        if let Some(v) = params.threshold {
            query.threshold = v;
        }
        if let Some(v) = params.max_hops {
            query.max_hops = v;
        }
        query.layer_filter = params
            .layer_filter
            .filter(|layers| !layers.is_empty())
            .map(|layers| layers.into_iter().collect());

        let index = Arc::clone(&self.index);
        let seeds = params.seed;
        run_blocking(move || {
            let graph = index.snapshot()?;
            spread_activation(&graph, &seeds, &query)
        })
        .await
    }

    /// Token-bounded context for a free-text query.
    #[tool(description = "Assemble a markdown context block from the documents most related to a free-text query, within a token budget.")]
    async fn get_context(
        &self,
        Parameters(params): Parameters<GetContextParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, "get_context called");

        let mut options = ContextOptions::from_config(&self.config.context);
        if let Some(v) = params.token_budget {
            options.token_budget = v;
        }
        options.include_full = params.include_full.unwrap_or(false);
        let activation = ActivationConfig::from_defaults(&self.config.query);

        let index = Arc::clone(&self.index);
        let query = params.query;
        run_blocking(move || {
            let graph = index.snapshot()?;
            let source = index.document_source();
            context_for_query(&graph, &source, &query, &activation, &options)
        })
        .await
    }

    /// Direct neighbours of one document.
    #[tool(description = "List a document's inbound and outbound links, and optionally its hierarchy parents, children, and siblings.")]
    async fn navigate_node(
        &self,
        Parameters(params): Parameters<NavigateNodeParams>,
    ) -> Result<String, String> {
        tracing::info!(id = %params.id, "navigate_node called");

        let index = Arc::clone(&self.index);
        let include_hierarchy = params.include_hierarchy.unwrap_or(false);
        run_blocking(move || {
            let graph = index.snapshot()?;
            navigate(&graph, &params.id, include_hierarchy)
        })
        .await
    }

    /// Graph size, age, and freshness.
    #[tool(description = "Report node and edge counts, last build time, stale document count, freshness percentage, and whether a rebuild is recommended.")]
    async fn graph_status(
        &self,
        Parameters(_params): Parameters<GraphStatusParams>,
    ) -> Result<String, String> {
        tracing::info!("graph_status called");

        let index = Arc::clone(&self.index);
        let threshold = self.config.status.rebuild_threshold;
        run_blocking(move || {
            let graph = index.current();
            index.with_db(|conn| graph_status(graph.as_deref(), conn, threshold))
        })
        .await
    }

    /// Rebuild the graph from the vault.
    #[tool(description = "Rebuild the knowledge graph from the vault. Set incremental=true to only reparse stale or modified documents. Fails if a build is already running.")]
    async fn rebuild_graph(
        &self,
        Parameters(params): Parameters<RebuildGraphParams>,
    ) -> Result<String, String> {
        let mode = if params.incremental.unwrap_or(false) {
            BuildMode::Incremental
        } else {
            BuildMode::Full
        };
        tracing::info!(mode = ?mode, "rebuild_graph called");

        let index = Arc::clone(&self.index);
        run_blocking(move || index.rebuild(mode)).await
    }

    /// Record that a tool wrote a vault file.
    #[tool(description = "Notify the index that a tool wrote a file. Markdown files inside the vault written by watched tools are marked stale until the next rebuild.")]
    async fn mark_stale(
        &self,
        Parameters(params): Parameters<MarkStaleParams>,
    ) -> Result<String, String> {
        tracing::info!(tool = %params.tool, path = %params.path, "mark_stale called");

        let index = Arc::clone(&self.index);
        let invalidator = Arc::clone(&self.invalidator);
        run_blocking(move || {
            let marked = index.with_db(|conn| {
                invalidator.handle(conn, index.vault_root(), &params.tool, &params.path)
            })?;
            Ok(serde_json::json!({ "path": params.path, "marked": marked }))
        })
        .await
    }

    /// Read one document straight from the vault.
    #[tool(description = "Read a vault document by path. Returns its title, layer, tags, and body, or the validation errors and raw text if its frontmatter is invalid.")]
    async fn read_document(
        &self,
        Parameters(params): Parameters<ReadDocumentParams>,
    ) -> Result<String, String> {
        tracing::info!(path = %params.path, "read_document called");

        let index = Arc::clone(&self.index);
        run_blocking(move || Ok(index.read_document(&params.path))).await
    }
}

/// Run index work off the async runtime and serialize its result. Index errors
/// become `{"error": ...}` payloads.
async fn run_blocking<T, F>(f: F) -> Result<String, String>
where
    F: FnOnce() -> IndexResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| format!("index task failed: {e}"))?;
    match result {
        Ok(value) => serde_json::to_string(&value).map_err(|e| format!("serialization failed: {e}")),
        Err(e) => {
            tracing::warn!(error = %e, "tool call failed");
            Err(e.to_payload().to_string())
        }
    }
}

#[tool_handler]
impl ServerHandler for StrataTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Strata indexes a layered markdown vault as a knowledge graph. Use query_graph \
                 to find related documents, get_context for a token-bounded briefing, and \
                 navigate_node to walk links. Call mark_stale after editing vault files and \
                 rebuild_graph when graph_status recommends it."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
