use anyhow::Result;

use spellbook::archive::EntityType;
use spellbook::config::SpellbookConfig;
use spellbook::index::query::list_entities_with_aliases;

/// List entities with their aliases, grouped by type.
pub fn entities(config: &SpellbookConfig, entity_type: Option<EntityType>) -> Result<()> {
    let vault = super::open_vault(config)?;
    let listed = list_entities_with_aliases(&vault.conn, entity_type)?;

    if listed.is_empty() {
        println!("No entities indexed.");
        return Ok(());
    }

    let mut current = None;
    for (entity, aliases) in &listed {
        if current != Some(entity.entity_type) {
            if current.is_some() {
                println!();
            }
            println!("{}:", entity.entity_type);
            current = Some(entity.entity_type);
        }
        let others: Vec<&str> = aliases
            .iter()
            .map(String::as_str)
            .filter(|a| *a != entity.name)
            .collect();
        if others.is_empty() {
            println!("  {}", entity.name);
        } else {
            println!("  {} (aka {})", entity.name, others.join(", "));
        }
    }

    Ok(())
}
