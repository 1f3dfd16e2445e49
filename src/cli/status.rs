use anyhow::Result;

use spellbook::config::SpellbookConfig;
use spellbook::db::migrations::get_last_rebuild;

/// One-screen overview: archive size, pending transcripts, index freshness.
pub fn status(config: &SpellbookConfig) -> Result<()> {
    let vault = super::open_vault(config)?;

    let documents = vault.store.list_ids()?;
    let pending = vault.store.pending_buffer_count()?;
    let indexed: i64 =
        vault
            .conn
            .query_row("SELECT COUNT(DISTINCT doc_id) FROM refs", [], |row| row.get(0))?;

    println!("Vault:               {}", vault.store.root().display());
    println!("Index:               {}", vault.db_path.display());
    println!("Documents:           {}", documents.len());
    if let (Some(first), Some(last)) = (documents.first(), documents.last()) {
        println!("  Span:              {} .. {}", first.date, last.date);
    }
    println!("Indexed documents:   {indexed}");
    println!("Pending transcripts: {pending}");
    match get_last_rebuild(&vault.conn)? {
        Some(at) => println!("Last rebuild:        {at}"),
        None => println!("Last rebuild:        never (run `spellbook rebuild`)"),
    }

    Ok(())
}
