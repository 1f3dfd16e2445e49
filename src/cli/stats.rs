use anyhow::Result;

use spellbook::config::SpellbookConfig;

/// Display index statistics in the terminal.
pub fn stats(config: &SpellbookConfig) -> Result<()> {
    let vault = super::open_vault(config)?;

    let response = spellbook::index::stats::index_stats(&vault.conn, Some(vault.db_path.as_path()))?;

    println!("Index Statistics");
    println!("{}", "=".repeat(40));
    println!("  Entities:            {}", response.entities);
    println!("  Aliases:             {}", response.aliases);
    println!("  Refs:                {}", response.refs);
    println!("  Documents:           {}", response.documents);
    println!();

    println!("By Type:");
    for (t, count) in &response.by_type {
        println!("  {:<12} {}", t, count);
    }
    println!();

    println!("Database size:         {}", super::format_bytes(response.db_size_bytes));

    if let Some(ref oldest) = response.oldest_ref {
        println!("Oldest mention:        {oldest}");
    }
    if let Some(ref newest) = response.newest_ref {
        println!("Newest mention:        {newest}");
    }
    if let Some(ref at) = response.last_rebuild {
        println!("Last rebuild:          {at}");
    }

    Ok(())
}
