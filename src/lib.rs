//! Layered markdown vaults as a queryable knowledge graph.
//!
//! Strata scans a vault of markdown documents with YAML frontmatter, builds a
//! directed weighted graph from their links, directory hierarchy, and declared
//! relationships, and answers recall queries by spreading activation from seed
//! documents. Results can be assembled into a token-bounded context block for
//! an AI agent. Everything is exposed over [MCP](https://modelcontextprotocol.io/)
//! and a CLI.
//!
//! Every document carries a `layer` from 1 to 5:
//!
//! | Layer | Role |
//! |-------|------|
//! | **1** | Core identity |
//! | **2** | Derived knowledge |
//! | **3** | External sources |
//! | **4** | Actionable, often expiring |
//! | **5** | Context |
//!
//! # Architecture
//!
//! - **Parsing**: frontmatter split and validated per file, in parallel
//! - **Graph**: immutable snapshots, swapped atomically on rebuild and persisted as JSON
//! - **Metadata**: SQLite tracks the last build and which documents went stale since
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, and migrations for the metadata store
//! - [`error`]: Typed errors returned across the tool boundary
//! - [`graph`]: Graph building, spreading activation, context assembly, and freshness
//! - [`vault`]: Vault scanning, frontmatter validation, and reference extraction

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod vault;
