use anyhow::Result;

use spellbook::config::SpellbookConfig;
use spellbook::index::query::docs_in_time_range;

/// List documents with mentions in `[start, end)`, most recent first.
pub fn range(config: &SpellbookConfig, start: &str, end: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let start = super::parse_time_arg(start)?;
    let end = super::parse_time_arg(end)?;

    let docs = docs_in_time_range(&vault.conn, start, end)?;
    println!(
        "{} document(s) between {} and {}",
        docs.len(),
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    );
    super::print_docs(&docs);
    Ok(())
}
