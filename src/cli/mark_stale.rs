use anyhow::Result;
use strata::config::StrataConfig;
use strata::graph::invalidation::Invalidator;

/// Mark a written file stale. Meant to be called from an editor or agent
/// post-write hook.
pub fn mark_stale(config: &StrataConfig, tool: &str, path: &str) -> Result<()> {
    let conn = strata::db::open_database(config.resolved_db_path())?;
    let invalidator = Invalidator::from_config(&config.invalidation);
    let vault_root = config.resolved_vault_root();

    if invalidator.handle(&conn, &vault_root, tool, path)? {
        println!("Marked stale: {path}");
    } else {
        println!("Ignored: {path} (tool {tool} not watched or not a vault document)");
    }
    Ok(())
}
