use anyhow::Result;

use spellbook::config::SpellbookConfig;
use spellbook::index::query::cross_reference;

/// Documents mentioning every one of `terms`.
pub fn xref(config: &SpellbookConfig, terms: &[String]) -> Result<()> {
    let vault = super::open_vault(config)?;
    let terms: Vec<&str> = terms.iter().map(String::as_str).collect();

    let result = cross_reference(&vault.conn, &terms)?;

    for term in &result.unresolved {
        println!("Unknown entity: {term}");
    }
    if !result.unresolved.is_empty() {
        return Ok(());
    }

    let names: Vec<&str> = result.resolved.iter().map(|e| e.name.as_str()).collect();
    println!("{} document(s) mentioning {}", result.docs.len(), names.join(" + "));
    super::print_docs(&result.docs);
    Ok(())
}
