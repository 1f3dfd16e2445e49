//! MCP server initialization over stdio.
//!
//! [`serve_stdio`] opens the index and document store and wires them into the
//! read-only tool handler. There is no network transport.

use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

use crate::tools::SpellbookTools;
use spellbook::archive::DocumentStore;
use spellbook::config::SpellbookConfig;
use spellbook::db;
use spellbook::db::migrations::get_last_rebuild;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SpellbookConfig) -> Result<()> {
    tracing::info!("starting Spellbook MCP server on stdio");

    let db_path = config.resolved_db_path()?;
    let store = DocumentStore::new(config.resolved_knowledge_dir()?);
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), vault = %store.root().display(), "index ready");

    if get_last_rebuild(&conn)?.is_none() {
        tracing::warn!("index has never been rebuilt; run `spellbook rebuild` to populate it");
    }

    let db = Arc::new(Mutex::new(conn));
    let tools = SpellbookTools::new(db, store, db_path, Arc::new(config));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
