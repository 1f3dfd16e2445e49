//! CLI `lookup` command: resolve a term and list its documents, falling back
//! to a keyword scan of the archive when nothing resolves.

use anyhow::Result;
use chrono::Utc;

use spellbook::config::SpellbookConfig;
use spellbook::index::query::{keyword_search, lookup as lookup_entity};

pub fn lookup(config: &SpellbookConfig, term: &str, limit: Option<usize>) -> Result<()> {
    let vault = super::open_vault(config)?;
    let limit = limit.unwrap_or(config.retrieval.default_limit);

    if let Some(found) = lookup_entity(&vault.conn, term)? {
        let e = &found.entity;
        println!("{} ({})", e.name, e.entity_type);
        println!("{}", "=".repeat(50));
        println!("  Aliases:         {}", found.aliases.join(", "));
        println!("  First mentioned: {}", e.created.format("%Y-%m-%d %H:%M"));
        println!("  Last mentioned:  {}", e.last_mentioned.format("%Y-%m-%d %H:%M"));
        println!("  Documents:       {}", found.docs.len());
        println!();
        let shown = &found.docs[..found.docs.len().min(limit)];
        super::print_docs(shown);
        if found.docs.len() > shown.len() {
            println!("  ... {} more", found.docs.len() - shown.len());
        }
        return Ok(());
    }

    let window = config.keyword_window(Utc::now());
    println!("No entity matches {term:?}; scanning documents for the keyword.");
    if let Some((start, _)) = window {
        println!("(documents since {})", start.format("%Y-%m-%d"));
    }

    let hits = keyword_search(&vault.store, term, window, limit)?;
    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    for hit in &hits {
        println!("  {}  {}", hit.doc_id, hit.line);
    }

    Ok(())
}
