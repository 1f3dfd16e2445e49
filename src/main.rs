mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spellbook::archive::EntityType;
use spellbook::config::SpellbookConfig;

#[derive(Parser)]
#[command(
    name = "spellbook",
    version,
    about = "Entity index and retrieval for a personal knowledge archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the read-only MCP server (stdio transport)
    Serve,
    /// Discard the index and rebuild it from the documents
    Rebuild,
    /// Show archive size, pending transcripts, and index freshness
    Status,
    /// List entities and their aliases
    Entities {
        /// Only this type: person, project, tool, repo, concept, org
        #[arg(long = "type")]
        entity_type: Option<EntityType>,
    },
    /// Show an entity and the documents mentioning it
    Lookup {
        term: String,
        /// Maximum documents (or keyword matches) to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List documents with mentions in [start, end)
    Range { start: String, end: String },
    /// List documents mentioning every given entity
    Xref {
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },
    /// Add an alias for an existing entity
    Alias { alias: String, entity: String },
    /// Merge a duplicate entity into a survivor
    Merge { duplicate: String, survivor: String },
    /// Rename an entity, keeping the old name as an alias
    Rename { entity: String, new_name: String },
    /// Show index statistics
    Stats,
    /// Check database health and compare the index with the documents
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = SpellbookConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and command output.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Rebuild => cli::rebuild::rebuild(&config)?,
        Command::Status => cli::status::status(&config)?,
        Command::Entities { entity_type } => cli::entities::entities(&config, entity_type)?,
        Command::Lookup { term, limit } => cli::lookup::lookup(&config, &term, limit)?,
        Command::Range { start, end } => cli::range::range(&config, &start, &end)?,
        Command::Xref { terms } => cli::xref::xref(&config, &terms)?,
        Command::Alias { alias, entity } => cli::curate::alias(&config, &alias, &entity)?,
        Command::Merge {
            duplicate,
            survivor,
        } => cli::curate::merge(&config, &duplicate, &survivor)?,
        Command::Rename { entity, new_name } => cli::curate::rename(&config, &entity, &new_name)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
