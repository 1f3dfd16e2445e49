//! CLI `doctor` command: database diagnostics plus a drift check of the index
//! against the documents.

use anyhow::{Context, Result};

use spellbook::config::SpellbookConfig;
use spellbook::db;
use spellbook::index::rebuild::{verify_index, SetDiff};

/// Rows shown per drift category before truncating.
const DRIFT_SAMPLE: usize = 5;

pub fn doctor(config: &SpellbookConfig) -> Result<()> {
    let db_path = config.resolved_db_path()?;

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `spellbook rebuild` to create it from the archive.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let vault = super::open_vault(config).context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&vault.conn).context("failed to run health check")?;

    println!("Spellbook Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", super::format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!(
        "Last rebuild:      {}",
        report.last_rebuild.as_deref().unwrap_or("(never)")
    );
    println!();
    println!("Row counts:");
    println!("  Entities:        {}", report.entity_count);
    println!("  Aliases:         {}", report.alias_count);
    println!("  Refs:            {}", report.ref_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  The index is derived from the archive and safe to discard:");
        println!("     rm {}", db_path.display());
        println!("     spellbook rebuild");
        return Ok(());
    }

    println!();
    let drift = verify_index(&vault.conn, &vault.store).context("failed to run drift check")?;
    if drift.skipped_documents > 0 {
        println!(
            "Corrupt documents: {} (run `spellbook rebuild` to list them)",
            drift.skipped_documents
        );
    }
    if drift.is_clean() {
        println!("Drift check:       PASSED (index matches documents)");
        return Ok(());
    }

    println!("Drift check:       index differs from what the documents imply");
    print_diff("Entities", &drift.entities);
    print_diff("Aliases", &drift.aliases);
    print_diff("Refs", &drift.refs);
    println!();
    println!("Manual aliases and merges also show up here. `spellbook rebuild` resets the");
    println!("index to the documents.");

    Ok(())
}

fn print_diff(label: &str, diff: &SetDiff) {
    if diff.is_empty() {
        return;
    }
    println!("  {label}:");
    for (marker, rows) in [("-", &diff.only_in_index), ("+", &diff.only_in_documents)] {
        for row in rows.iter().take(DRIFT_SAMPLE) {
            println!("    {marker} {row}");
        }
        if rows.len() > DRIFT_SAMPLE {
            println!("    {marker} ... {} more", rows.len() - DRIFT_SAMPLE);
        }
    }
}
