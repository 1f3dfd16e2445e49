pub mod cross_reference;
pub mod docs_in_range;
pub mod entities_of_type;
pub mod index_stats;
pub mod keyword_search;
pub mod lookup_entity;

use chrono::{DateTime, Utc};
use cross_reference::CrossReferenceParams;
use docs_in_range::DocsInRangeParams;
use entities_of_type::EntitiesOfTypeParams;
use index_stats::IndexStatsParams;
use keyword_search::KeywordSearchParams;
use lookup_entity::LookupEntityParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use spellbook::archive::frontmatter::parse_timestamp;
use spellbook::archive::{DocumentStore, EntityType};
use spellbook::config::SpellbookConfig;
use spellbook::index::query;

/// The Spellbook MCP tool handler. Holds shared state (index connection,
/// document store, config) and exposes the read-only retrieval tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct SpellbookTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    store: DocumentStore,
    db_path: Arc<PathBuf>,
    config: Arc<SpellbookConfig>,
}

impl SpellbookTools {
    /// Run `f` against the index on the blocking pool.
    async fn with_index<T, F>(&self, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> spellbook::error::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|e| format!("db lock poisoned: {e}"))?;
            f(&conn).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl SpellbookTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        store: DocumentStore,
        db_path: PathBuf,
        config: Arc<SpellbookConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            store,
            db_path: Arc::new(db_path),
            config,
        }
    }

    /// Resolve a name or alias and list the documents mentioning it.
    #[tool(description = "Look up an entity by name or alias (case-insensitive). Returns the canonical entity, its aliases, and the documents mentioning it, most recent first.")]
    async fn lookup_entity(
        &self,
        Parameters(params): Parameters<LookupEntityParams>,
    ) -> Result<String, String> {
        tracing::info!(term = %params.term, "lookup_entity called");
        let limit = params.limit.unwrap_or(self.config.retrieval.default_limit);
        let term = params.term;

        let found = self
            .with_index(move |conn| query::lookup(conn, &term))
            .await?;

        match found {
            Some(mut found) => {
                let total = found.docs.len();
                found.docs.truncate(limit);
                to_json(&serde_json::json!({
                    "entity": found.entity,
                    "aliases": found.aliases,
                    "docs": found.docs,
                    "total_docs": total,
                }))
            }
            None => Ok(serde_json::json!({
                "entity": null,
                "message": "no entity matches this term; try keyword_search",
            })
            .to_string()),
        }
    }

    /// Documents with mentions inside a time window.
    #[tool(description = "List documents with entity mentions in [start, end), most recent first. Accepts RFC 3339 timestamps or YYYY-MM-DD dates.")]
    async fn docs_in_range(
        &self,
        Parameters(params): Parameters<DocsInRangeParams>,
    ) -> Result<String, String> {
        tracing::info!(start = %params.start, end = %params.end, "docs_in_range called");
        let start = parse_timestamp(&params.start)?;
        let end = parse_timestamp(&params.end)?;

        let docs = self
            .with_index(move |conn| query::docs_in_time_range(conn, start, end))
            .await?;
        to_json(&serde_json::json!({ "docs": docs, "total": docs.len() }))
    }

    /// Every entity of one type.
    #[tool(description = "List entities of one type (person, project, tool, repo, concept, org) with document counts, most recently mentioned first.")]
    async fn entities_of_type(
        &self,
        Parameters(params): Parameters<EntitiesOfTypeParams>,
    ) -> Result<String, String> {
        let entity_type: EntityType = params.r#type.parse()?;
        tracing::info!(entity_type = %entity_type, "entities_of_type called");

        if params.include_docs.unwrap_or(false) {
            let rows = self
                .with_index(move |conn| query::entities_of_type_with_docs(conn, entity_type))
                .await?;
            let entities: Vec<_> = rows
                .into_iter()
                .map(|(summary, docs)| serde_json::json!({ "entity": summary, "docs": docs }))
                .collect();
            return to_json(&serde_json::json!({ "entities": entities }));
        }

        let entities = self
            .with_index(move |conn| query::entities_of_type(conn, entity_type))
            .await?;
        to_json(&serde_json::json!({ "entities": entities }))
    }

    /// Documents where several entities meet.
    #[tool(description = "Find documents mentioning every one of the given entities. Unknown terms are reported and yield no documents.")]
    async fn cross_reference(
        &self,
        Parameters(params): Parameters<CrossReferenceParams>,
    ) -> Result<String, String> {
        if params.terms.is_empty() {
            return Err("terms must not be empty".into());
        }
        tracing::info!(terms = ?params.terms, "cross_reference called");
        let terms = params.terms;

        let result = self
            .with_index(move |conn| {
                let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
                query::cross_reference(conn, &terms)
            })
            .await?;
        to_json(&result)
    }

    /// Keyword fallback over document content.
    #[tool(description = "Scan document content for a keyword (case-insensitive). Slow: use only when lookup_entity finds nothing. Scans the configured recent window unless since/until are given.")]
    async fn keyword_search(
        &self,
        Parameters(params): Parameters<KeywordSearchParams>,
    ) -> Result<String, String> {
        tracing::info!(keyword = %params.keyword, "keyword_search called");
        let limit = params.limit.unwrap_or(self.config.retrieval.default_limit);

        let window = match (params.since.as_deref(), params.until.as_deref()) {
            (None, None) => self.config.keyword_window(Utc::now()),
            (since, until) => {
                let start = match since {
                    Some(s) => parse_timestamp(s)?,
                    None => DateTime::<Utc>::MIN_UTC,
                };
                let end = match until {
                    Some(u) => parse_timestamp(u)?,
                    None => Utc::now() + chrono::Duration::days(1),
                };
                Some((start, end))
            }
        };

        let store = self.store.clone();
        let keyword = params.keyword;
        let hits = tokio::task::spawn_blocking(move || {
            query::keyword_search(&store, &keyword, window, limit)
        })
        .await
        .map_err(|e| format!("scan task failed: {e}"))?
        .map_err(|e| e.to_string())?;

        to_json(&serde_json::json!({ "hits": hits, "total": hits.len() }))
    }

    /// Index statistics.
    #[tool(description = "Get index statistics: entity counts by type, aliases, refs, documents, and last rebuild time.")]
    async fn index_stats(
        &self,
        Parameters(_params): Parameters<IndexStatsParams>,
    ) -> Result<String, String> {
        tracing::info!("index_stats called");
        let db_path = Arc::clone(&self.db_path);
        let stats = self
            .with_index(move |conn| spellbook::index::stats::index_stats(conn, Some(db_path.as_path())))
            .await?;
        to_json(&stats)
    }
}

#[tool_handler]
impl ServerHandler for SpellbookTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Spellbook indexes a personal knowledge archive by the entities each document \
                 mentions. Use lookup_entity first, cross_reference to find where entities meet, \
                 docs_in_range for a time window, and keyword_search only as a fallback."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
