//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! metadata database, the graph index, and the MCP tool handler into a running
//! server.

use crate::tools::StrataTools;
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};
use strata::config::StrataConfig;
use strata::db;
use strata::graph::index::{BuildMode, GraphIndex};
use strata::graph::invalidation::Invalidator;

/// Shared setup: open the db, restore the last snapshot (or build one if none
/// exists), and wrap everything in `Arc` for sharing.
async fn setup_shared_state(
    config: StrataConfig,
) -> Result<(Arc<GraphIndex>, Arc<Invalidator>, Arc<StrataConfig>)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let index = Arc::new(GraphIndex::new(&config, Arc::new(Mutex::new(conn))));
    let invalidator = Arc::new(Invalidator::from_config(&config.invalidation));

    let startup = Arc::clone(&index);
    tokio::task::spawn_blocking(move || -> Result<()> {
        if startup.load_snapshot()? {
            return Ok(());
        }
        // A missing vault should not keep the server from starting.
        if let Err(e) = startup.rebuild(BuildMode::Full) {
            tracing::warn!(error = %e, "initial build failed, serving without a graph");
        }
        Ok(())
    })
    .await
    .context("startup task failed")??;

    Ok((index, invalidator, Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: StrataConfig) -> Result<()> {
    tracing::info!("starting Strata MCP server on stdio");

    let (index, invalidator, config) = setup_shared_state(config).await?;

    let tools = StrataTools::new(index, invalidator, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: StrataConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting Strata MCP server on HTTP");

    let (index, invalidator, config) = setup_shared_state(config).await?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(StrataTools::new(index.clone(), invalidator.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
