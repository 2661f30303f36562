//! Knowledge graph: building, querying, and tracking freshness.

pub mod activation;
pub mod builder;
pub mod context;
pub mod index;
pub mod invalidation;
pub mod navigate;
pub mod snapshot;
pub mod staleness;
pub mod status;
pub mod types;
