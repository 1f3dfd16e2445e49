//! CLI commands that edit the index by hand: `alias`, `merge`, `rename`.
//!
//! These changes live only in the index. A rebuild discards them; `doctor`
//! reports them as drift.

use anyhow::Result;

use spellbook::config::SpellbookConfig;
use spellbook::index::aliases::{add_alias, merge as merge_entities};
use spellbook::index::entities::rename_entity;

/// Point `alias` at the entity `target` resolves to.
pub fn alias(config: &SpellbookConfig, alias: &str, target: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let entity = super::resolve_entity(&vault.conn, target)?;

    if add_alias(&vault.conn, alias, &entity.id)? {
        println!("{alias} -> {} ({})", entity.name, entity.entity_type);
    } else {
        println!("{alias} already resolves to {}", entity.name);
    }
    Ok(())
}

/// Fold `duplicate` into `survivor`.
pub fn merge(config: &SpellbookConfig, duplicate: &str, survivor: &str) -> Result<()> {
    let mut vault = super::open_vault(config)?;
    let dup = super::resolve_entity(&vault.conn, duplicate)?;
    let keep = super::resolve_entity(&vault.conn, survivor)?;

    let outcome = merge_entities(&mut vault.conn, &dup.id, &keep.id)?;

    println!("Merged {} into {}", dup.name, outcome.survivor.name);
    println!("  Aliases moved:       {}", outcome.aliases_repointed);
    println!("  Refs moved:          {}", outcome.refs_repointed);
    println!("  Refs collapsed:      {}", outcome.refs_collapsed);
    Ok(())
}

/// Give an entity a new display name, keeping the old one as an alias.
pub fn rename(config: &SpellbookConfig, target: &str, new_name: &str) -> Result<()> {
    let mut vault = super::open_vault(config)?;
    let entity = super::resolve_entity(&vault.conn, target)?;

    let renamed = rename_entity(&mut vault.conn, &entity.id, new_name)?;
    println!("Renamed {} -> {}", entity.name, renamed.name);
    Ok(())
}
