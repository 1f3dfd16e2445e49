//! CLI `rebuild` command: discard the index and replay every document.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use spellbook::config::SpellbookConfig;
use spellbook::index::rebuild::rebuild_with_progress;

pub fn rebuild(config: &SpellbookConfig) -> Result<()> {
    let mut vault = super::open_vault(config)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} documents ({eta})")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    let report = rebuild_with_progress(&mut vault.conn, &vault.store, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })
    .context("rebuild failed, previous index left in place")?;
    pb.finish_and_clear();

    println!("Rebuild complete");
    println!("{}", "=".repeat(40));
    println!("  Files seen:          {}", report.files_seen);
    println!("  Documents indexed:   {}", report.documents_indexed);
    println!("  Mentions:            {}", report.mentions);
    println!("  Entities:            {}", report.entities_created);
    println!("  Refs:                {}", report.refs_added);
    println!("  Skipped:             {}", report.skipped_count());

    if !report.skipped.is_empty() {
        println!();
        println!("Skipped documents:");
        for corrupt in &report.skipped {
            println!("  {}: {}", corrupt.path.display(), corrupt.reason);
        }
    }

    Ok(())
}
